//! Month-range cost aggregation.
//!
//! Each matching subscription is expanded into the calendar months it covers
//! inside the requested window, and every covered month is charged at the
//! subscription's full monthly price. There is no prorating: a month counts
//! entirely or not at all.
//!
//! Store backends may narrow the candidate set however they like (e.g. with a
//! SQL `WHERE`), but the sum itself must come out identical to
//! [`total_cost`] over the unfiltered records.

use crate::{
  Error, Result,
  month::MonthRange,
  store::TotalQuery,
  subscription::Subscription,
};

/// Whether `sub` is active in at least one month of `window`. An open-ended
/// subscription is treated as running through `window.last`.
pub fn overlaps(sub: &Subscription, window: MonthRange) -> bool {
  let effective_end = sub.end_date.unwrap_or(window.last);
  sub.start_date <= window.last && effective_end >= window.first
}

/// Whether `sub` belongs to the query's user and service and overlaps its
/// window.
pub fn matches(sub: &Subscription, query: &TotalQuery) -> bool {
  sub.user_id == query.user_id()
    && query.service_name().is_none_or(|name| sub.service_name == name)
    && overlaps(sub, query.range())
}

/// The months of `window` in which `sub` is active. Inverted (and therefore
/// empty) when they do not overlap.
pub fn covered_months(sub: &Subscription, window: MonthRange) -> MonthRange {
  sub.active_within(window)
}

/// `price × covered months` for a single subscription. Zero when the clamped
/// range is empty (including an end date before the start date).
pub fn contribution(sub: &Subscription, window: MonthRange) -> Result<i64> {
  let months = covered_months(sub, window).len();
  let months = i64::try_from(months).map_err(|_| Error::TotalOverflow)?;
  sub.price.checked_mul(months).ok_or(Error::TotalOverflow)
}

/// Sum the contributions of every record in `subs` that matches `query`.
pub fn total_cost<'a, I>(subs: I, query: &TotalQuery) -> Result<i64>
where
  I: IntoIterator<Item = &'a Subscription>,
{
  if query.from() > query.to() {
    return Err(Error::validation("from must be <= to"));
  }

  subs
    .into_iter()
    .filter(|sub| matches(sub, query))
    .try_fold(0_i64, |total, sub| {
      total
        .checked_add(contribution(sub, query.range())?)
        .ok_or(Error::TotalOverflow)
    })
}
