//! Handlers for `/subscriptions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subscriptions` | Body: [`CreateSubscription`]; returns 201 + record |
//! | `GET`    | `/subscriptions` | Optional `user_id`, `service_name`, `limit` (50), `offset` (0) |
//! | `GET`    | `/subscriptions/total` | `user_id`, `from`, `to` required; optional `service_name` |
//! | `GET`    | `/subscriptions/{id}` | 404 if not found |
//! | `PUT`    | `/subscriptions/{id}` | Body: [`UpdateSubscription`]; partial |
//! | `DELETE` | `/subscriptions/{id}` | 204, or 404 if not found |

use axum::{
  Json,
  body::Bytes,
  extract::{
    Path, Query, State,
    rejection::{BytesRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Serialize, de::DeserializeOwned};
use subtrack_core::{
  request::{CreateSubscription, ListParams, TotalParams, UpdateSubscription},
  service::SubscriptionService,
  store::SubscriptionStore,
  subscription::Subscription,
};
use uuid::Uuid;

use crate::error::ApiError;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("invalid id".to_string()))
}

/// Decode a JSON body regardless of the request's `Content-Type`.
fn json_body<T>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError>
where
  T: DeserializeOwned,
{
  let invalid = || ApiError::BadRequest("invalid json".to_string());
  let bytes = body.map_err(|rejection| {
    tracing::debug!(%rejection, "failed to read request body");
    invalid()
  })?;
  serde_json::from_slice(&bytes).map_err(|error| {
    tracing::debug!(%error, "rejected request body");
    invalid()
  })
}

/// Query string as ordered key/value pairs; repeated keys are resolved by the
/// params type.
type QueryPairs = Vec<(String, String)>;

fn query_pairs(
  query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<QueryPairs, ApiError> {
  query.map(|Query(pairs)| pairs).map_err(|rejection| {
    tracing::debug!(%rejection, "rejected query string");
    ApiError::BadRequest("invalid query".to_string())
  })
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions`. Returns 201 + the stored [`Subscription`].
pub async fn create<S>(
  State(service): State<SubscriptionService<S>>,
  body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
{
  let input: CreateSubscription = json_body(body)?;
  let sub = service.create(input).await?;
  tracing::info!(id = %sub.id, user_id = %sub.user_id, "subscription created");
  Ok((StatusCode::CREATED, Json(sub)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subscriptions[?user_id=...][&service_name=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(service): State<SubscriptionService<S>>,
  query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: SubscriptionStore,
{
  let params: ListParams = query_pairs(query)?.into_iter().collect();
  Ok(Json(service.list(params).await?))
}

// ─── Total ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TotalResponse {
  pub total: i64,
}

/// `GET /subscriptions/total?user_id=...&from=YYYY-MM&to=YYYY-MM[&service_name=...]`
pub async fn total<S>(
  State(service): State<SubscriptionService<S>>,
  query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<TotalResponse>, ApiError>
where
  S: SubscriptionStore,
{
  let params: TotalParams = query_pairs(query)?.into_iter().collect();
  let total = service.total(params).await?;
  Ok(Json(TotalResponse { total }))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/{id}`
pub async fn get_one<S>(
  State(service): State<SubscriptionService<S>>,
  Path(id): Path<String>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  Ok(Json(service.get(id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /subscriptions/{id}`. Fields left out of the body are preserved;
/// `"end_date": ""` clears the end date.
pub async fn update<S>(
  State(service): State<SubscriptionService<S>>,
  Path(id): Path<String>,
  body: Result<Bytes, BytesRejection>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  let input: UpdateSubscription = json_body(body)?;
  let sub = service.update(id, input).await?;
  tracing::info!(id = %sub.id, "subscription updated");
  Ok(Json(sub))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subscriptions/{id}`: hard delete, 204 on success.
pub async fn delete<S>(
  State(service): State<SubscriptionService<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  service.delete(id).await?;
  tracing::info!(%id, "subscription deleted");
  Ok(StatusCode::NO_CONTENT)
}
