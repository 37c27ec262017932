//! [`SubscriptionService`]: validation and error mapping in front of a store.
//!
//! Handlers talk to the service, never to the store directly. The service owns
//! no state beyond a shared handle to the store, so it is cheap to clone into
//! every request.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  request::{CreateSubscription, ListParams, TotalParams, UpdateSubscription},
  store::SubscriptionStore,
  subscription::Subscription,
};

fn store_err<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

pub struct SubscriptionService<S> {
  store: Arc<S>,
}

impl<S> Clone for SubscriptionService<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: SubscriptionStore> SubscriptionService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  pub async fn create(&self, input: CreateSubscription) -> Result<Subscription> {
    let new = input.validate()?;
    self.store.create(new).await.map_err(store_err)
  }

  pub async fn get(&self, id: Uuid) -> Result<Subscription> {
    self
      .store
      .get(id)
      .await
      .map_err(store_err)?
      .ok_or(Error::NotFound(id))
  }

  pub async fn update(&self, id: Uuid, input: UpdateSubscription) -> Result<Subscription> {
    let patch = input.validate()?;
    self
      .store
      .update(id, patch)
      .await
      .map_err(store_err)?
      .ok_or(Error::NotFound(id))
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    if self.store.delete(id).await.map_err(store_err)? {
      Ok(())
    } else {
      Err(Error::NotFound(id))
    }
  }

  pub async fn list(&self, params: ListParams) -> Result<Vec<Subscription>> {
    let query = params.validate()?;
    self.store.list(&query).await.map_err(store_err)
  }

  /// Total monthly cost over an inclusive month range.
  pub async fn total(&self, params: TotalParams) -> Result<i64> {
    let query = params.validate()?;
    self.store.aggregate_total(&query).await.map_err(store_err)
  }
}
