//! Error types for `subtrack-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input. The message is safe to show to callers.
  #[error("{0}")]
  Validation(String),

  #[error("subscription not found: {0}")]
  NotFound(Uuid),

  #[error("total cost overflows a 64-bit integer")]
  TotalOverflow,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
