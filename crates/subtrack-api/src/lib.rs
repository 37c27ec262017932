//! JSON REST API for subscription tracking.
//!
//! Exposes an axum [`Router`] backed by any
//! [`subtrack_core::store::SubscriptionStore`]. Transport concerns (listening,
//! tracing middleware, health checks) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", subtrack_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod subscriptions;

use axum::{Router, routing::get};
use subtrack_core::{service::SubscriptionService, store::SubscriptionStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: SubscriptionService<S>) -> Router<()>
where
  S: SubscriptionStore + 'static,
{
  Router::new()
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route("/subscriptions/total", get(subscriptions::total::<S>))
    .route(
      "/subscriptions/{id}",
      get(subscriptions::get_one::<S>)
        .put(subscriptions::update::<S>)
        .delete(subscriptions::delete::<S>),
    )
    .with_state(service)
}
