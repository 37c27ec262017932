//! The subscription record and its create/update shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::month::{Month, MonthRange};

// ─── Subscription ────────────────────────────────────────────────────────────

/// A user's subscription to a paid service, priced per calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  /// Server-generated; never changes.
  pub id:           Uuid,
  pub service_name: String,
  /// Cost per month in minor currency units. Always positive.
  pub price:        i64,
  /// Owning user; never changes.
  pub user_id:      Uuid,
  /// First active month.
  pub start_date:   Month,
  /// Last active month, inclusive. `None` means open-ended.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date:     Option<Month>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Subscription {
  /// The months this subscription is active within `window`, with an
  /// open-ended subscription clamped to the window's last month.
  pub fn active_within(&self, window: MonthRange) -> MonthRange {
    let effective_end = self.end_date.unwrap_or(window.last);
    MonthRange::new(
      self.start_date.max(window.first),
      effective_end.min(window.last),
    )
  }

  /// Apply a validated partial update in place. Identity and timestamps are
  /// left alone; the store stamps `updated_at`.
  pub fn apply(&mut self, patch: SubscriptionPatch) {
    if let Some(name) = patch.service_name {
      self.service_name = name;
    }
    if let Some(price) = patch.price {
      self.price = price;
    }
    if let Some(start) = patch.start_date {
      self.start_date = start;
    }
    patch.end_date.apply_to(&mut self.end_date);
  }
}

// ─── NewSubscription ─────────────────────────────────────────────────────────

/// Validated input to [`crate::store::SubscriptionStore::create`].
/// `id`, `created_at` and `updated_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
  pub service_name: String,
  pub price:        i64,
  pub user_id:      Uuid,
  pub start_date:   Month,
  pub end_date:     Option<Month>,
}

// ─── Patches ─────────────────────────────────────────────────────────────────

/// A field update that can leave a nullable value alone, replace it, or
/// clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
  #[default]
  Unchanged,
  Set(T),
  Clear,
}

impl<T> Patch<T> {
  pub fn is_unchanged(&self) -> bool { matches!(self, Self::Unchanged) }

  pub fn apply_to(self, slot: &mut Option<T>) {
    match self {
      Self::Unchanged => {}
      Self::Set(v) => *slot = Some(v),
      Self::Clear => *slot = None,
    }
  }
}

/// Validated partial update. Absent fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
  pub service_name: Option<String>,
  pub price:        Option<i64>,
  pub start_date:   Option<Month>,
  pub end_date:     Patch<Month>,
}

impl SubscriptionPatch {
  pub fn is_empty(&self) -> bool {
    self.service_name.is_none()
      && self.price.is_none()
      && self.start_date.is_none()
      && self.end_date.is_unchanged()
  }
}
