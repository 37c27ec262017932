//! The `SubscriptionStore` trait and its query types.
//!
//! The trait is implemented by storage backends (e.g. `subtrack-store-sqlite`).
//! [`crate::service::SubscriptionService`] and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error, Result,
  month::{Month, MonthRange},
  subscription::{NewSubscription, Subscription, SubscriptionPatch},
};

pub const DEFAULT_LIST_LIMIT: u32 = 50;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`SubscriptionStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
  pub user_id:      Option<Uuid>,
  /// Exact match on the service name.
  pub service_name: Option<String>,
  pub limit:        u32,
  pub offset:       u32,
}

impl Default for ListQuery {
  fn default() -> Self {
    Self {
      user_id:      None,
      service_name: None,
      limit:        DEFAULT_LIST_LIMIT,
      offset:       0,
    }
  }
}

/// Parameters for [`SubscriptionStore::aggregate_total`].
///
/// Only constructible through [`TotalQuery::new`], which guarantees
/// `from <= to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalQuery {
  user_id:      Uuid,
  service_name: Option<String>,
  range:        MonthRange,
}

impl TotalQuery {
  /// An empty `service_name` is treated as "all services".
  pub fn new(
    user_id: Uuid,
    service_name: Option<String>,
    from: Month,
    to: Month,
  ) -> Result<Self> {
    if from > to {
      return Err(Error::validation("from must be <= to"));
    }
    Ok(Self {
      user_id,
      service_name: service_name.filter(|s| !s.is_empty()),
      range: MonthRange::new(from, to),
    })
  }

  pub fn user_id(&self) -> Uuid { self.user_id }

  pub fn service_name(&self) -> Option<&str> { self.service_name.as_deref() }

  pub fn range(&self) -> MonthRange { self.range }

  pub fn from(&self) -> Month { self.range.first }

  pub fn to(&self) -> Month { self.range.last }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a subscription store backend.
///
/// Lookups by id report a miss as `None` (or `false` for deletes) rather than
/// as an error; [`crate::service::SubscriptionService`] turns misses into
/// [`Error::NotFound`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new subscription, assigning its id and timestamps.
  fn create(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Apply `patch` to the stored record and bump `updated_at`. Returns the
  /// updated record, or `None` if `id` does not exist. Concurrent updates are
  /// last-write-wins.
  fn update(
    &self,
    id: Uuid,
    patch: SubscriptionPatch,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Hard-delete a record. Returns `false` if nothing was deleted.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Filtered, paginated listing, newest first by `created_at`.
  fn list<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;

  /// Total cost of the matching subscriptions over the query's month range.
  /// Must agree exactly with [`crate::aggregate::total_cost`].
  fn aggregate_total<'a>(
    &'a self,
    query: &'a TotalQuery,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;
}
