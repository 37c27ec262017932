//! Unvalidated request shapes and their validation.
//!
//! These mirror what arrives over the wire: ids and months are still strings,
//! and required fields may be missing. Each shape has a `validate` method that
//! produces the typed domain input or an [`Error::Validation`] describing the
//! first problem found.

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  month::Month,
  store::{DEFAULT_LIST_LIMIT, ListQuery, TotalQuery},
  subscription::{NewSubscription, Patch, SubscriptionPatch},
};

const CREATE_REQUIRED: &str = "service_name, price (>0), user_id, start_date required";

fn parse_user_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw).map_err(|_| Error::validation("invalid user_id"))
}

fn parse_month(raw: &str, field: &str) -> Result<Month> {
  Month::parse(raw).map_err(|_| Error::validation(format!("invalid {field} (YYYY-MM)")))
}

/// Query strings may repeat a key; the first occurrence wins.
fn keep_first(slot: &mut Option<String>, value: String) {
  if slot.is_none() {
    *slot = Some(value);
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Body of a create request. Every field defaults so that a missing field is
/// reported as a validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateSubscription {
  pub service_name: String,
  pub price:        i64,
  pub user_id:      String,
  /// `YYYY-MM`.
  pub start_date:   String,
  /// `YYYY-MM`; absent or empty means open-ended.
  pub end_date:     Option<String>,
}

impl CreateSubscription {
  pub fn validate(self) -> Result<NewSubscription> {
    if self.service_name.is_empty()
      || self.price <= 0
      || self.user_id.is_empty()
      || self.start_date.is_empty()
    {
      return Err(Error::validation(CREATE_REQUIRED));
    }

    let user_id = parse_user_id(&self.user_id)?;
    let start_date = parse_month(&self.start_date, "start_date")?;
    let end_date = match self.end_date.as_deref() {
      None | Some("") => None,
      Some(raw) => Some(parse_month(raw, "end_date")?),
    };

    Ok(NewSubscription {
      service_name: self.service_name,
      price: self.price,
      user_id,
      start_date,
      end_date,
    })
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Body of a partial update. `None` leaves a field unchanged. For `end_date`,
/// an empty string clears the end date.
///
/// `user_id` is immutable and is ignored if sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSubscription {
  pub service_name: Option<String>,
  pub price:        Option<i64>,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
}

impl UpdateSubscription {
  pub fn validate(self) -> Result<SubscriptionPatch> {
    if self.service_name.as_deref() == Some("") {
      return Err(Error::validation("service_name must not be empty"));
    }
    if self.price.is_some_and(|p| p <= 0) {
      return Err(Error::validation("price must be > 0"));
    }

    let start_date = self
      .start_date
      .as_deref()
      .map(|raw| parse_month(raw, "start_date"))
      .transpose()?;

    let end_date = match self.end_date.as_deref() {
      None => Patch::Unchanged,
      Some("") => Patch::Clear,
      Some(raw) => Patch::Set(parse_month(raw, "end_date")?),
    };

    Ok(SubscriptionPatch {
      service_name: self.service_name,
      price: self.price,
      start_date,
      end_date,
    })
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

/// Query string of a list request. Pagination values that do not parse as
/// non-negative integers fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
  pub user_id:      Option<String>,
  pub service_name: Option<String>,
  pub limit:        Option<String>,
  pub offset:       Option<String>,
}

impl ListParams {
  pub fn validate(self) -> Result<ListQuery> {
    let user_id = self
      .user_id
      .as_deref()
      .filter(|s| !s.is_empty())
      .map(parse_user_id)
      .transpose()?;

    let lenient = |raw: Option<&str>, default: u32| {
      raw.and_then(|s| s.parse::<u32>().ok()).unwrap_or(default)
    };

    Ok(ListQuery {
      user_id,
      service_name: self.service_name.filter(|s| !s.is_empty()),
      limit: lenient(self.limit.as_deref(), DEFAULT_LIST_LIMIT),
      offset: lenient(self.offset.as_deref(), 0),
    })
  }
}

impl FromIterator<(String, String)> for ListParams {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
    let mut params = Self::default();
    for (key, value) in pairs {
      let slot = match key.as_str() {
        "user_id" => &mut params.user_id,
        "service_name" => &mut params.service_name,
        "limit" => &mut params.limit,
        "offset" => &mut params.offset,
        _ => continue,
      };
      keep_first(slot, value);
    }
    params
  }
}

// ─── Total ───────────────────────────────────────────────────────────────────

/// Query string of a total-cost request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TotalParams {
  pub user_id:      Option<String>,
  pub service_name: Option<String>,
  /// `YYYY-MM`, inclusive.
  pub from:         Option<String>,
  /// `YYYY-MM`, inclusive.
  pub to:           Option<String>,
}

impl TotalParams {
  pub fn validate(self) -> Result<TotalQuery> {
    let user_id = match self.user_id.as_deref() {
      None | Some("") => return Err(Error::validation("user_id required")),
      Some(raw) => parse_user_id(raw)?,
    };

    let (from, to) = match (self.from.as_deref(), self.to.as_deref()) {
      (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => (from, to),
      _ => return Err(Error::validation("from and to required (YYYY-MM)")),
    };
    let from = parse_month(from, "from")?;
    let to = parse_month(to, "to")?;

    TotalQuery::new(user_id, self.service_name, from, to)
  }
}

impl FromIterator<(String, String)> for TotalParams {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
    let mut params = Self::default();
    for (key, value) in pairs {
      let slot = match key.as_str() {
        "user_id" => &mut params.user_id,
        "service_name" => &mut params.service_name,
        "from" => &mut params.from,
        "to" => &mut params.to,
        _ => continue,
      };
      keep_first(slot, value);
    }
    params
  }
}
