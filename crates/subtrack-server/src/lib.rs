//! HTTP server assembly for the subscription service.
//!
//! Composes the JSON API under `/api/v1`, a `/healthz` probe, and request
//! tracing into a single axum [`Router`] backed by any [`SubscriptionStore`].

use std::path::{Path, PathBuf};

use axum::{Router, routing::get};
use serde::Deserialize;
use subtrack_core::{service::SubscriptionService, store::SubscriptionStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SUBTRACK_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  /// `prod` switches logging to JSON lines at `info`; anything else logs
  /// human-readable output at `debug`.
  pub env:        String,
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      env:        "dev".to_string(),
      host:       "0.0.0.0".to_string(),
      port:       8080,
      store_path: PathBuf::from("subscriptions.db"),
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("SUBTRACK"))
      .build()?
      .try_deserialize()
  }

  pub fn is_production(&self) -> bool { self.env == "prod" }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(service: SubscriptionService<S>) -> Router
where
  S: SubscriptionStore + 'static,
{
  Router::new()
    .route("/healthz", get(healthz))
    .nest("/api/v1", subtrack_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
