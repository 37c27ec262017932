//! Calendar-month granularity.
//!
//! Subscriptions are active for whole months. A [`Month`] is a date pinned to
//! the first day of its month; [`MonthRange`] is an inclusive run of months
//! that is always walked one step at a time, so month length never enters the
//! arithmetic.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

// ─── Month ───────────────────────────────────────────────────────────────────

/// A month-truncated date. The inner day is always 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
  /// Build a month from a year and a 1-based month number.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, 1).map(Self)
  }

  /// Truncate any calendar date to its month.
  pub fn from_date(date: NaiveDate) -> Self {
    // Day 1 exists in every month, so `with_day(1)` cannot fail.
    Self(date.with_day(1).unwrap_or(date))
  }

  /// Parse the `YYYY-MM` textual form. Nothing else is accepted: no day
  /// component, no whitespace, no single-digit months.
  pub fn parse(s: &str) -> Result<Self> {
    let invalid = || Error::validation(format!("invalid month {s:?} (expected YYYY-MM)"));

    let bytes = s.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
      return Err(invalid());
    }
    let (year, month) = (&s[..4], &s[5..]);
    if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    Self::new(year, month).ok_or_else(invalid)
  }

  /// The first day of this month.
  pub fn first_day(self) -> NaiveDate { self.0 }

  pub fn year(self) -> i32 { self.0.year() }

  pub fn month(self) -> u32 { self.0.month() }

  /// The following calendar month, or `None` past the end of the calendar.
  pub fn succ(self) -> Option<Self> {
    self.0.checked_add_months(Months::new(1)).map(Self)
  }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year(), self.month())
  }
}

impl Serialize for Month {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Month {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Month::parse(&raw).map_err(serde::de::Error::custom)
  }
}

// ─── MonthRange ──────────────────────────────────────────────────────────────

/// An inclusive range of months. An inverted range (`first > last`) is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
  pub first: Month,
  pub last:  Month,
}

impl MonthRange {
  pub fn new(first: Month, last: Month) -> Self { Self { first, last } }

  pub fn iter(&self) -> MonthIter {
    MonthIter {
      next: (self.first <= self.last).then_some(self.first),
      last: self.last,
    }
  }

  /// Number of months in the range, counted by stepping through it.
  pub fn len(&self) -> usize { self.iter().count() }

  pub fn is_empty(&self) -> bool { self.first > self.last }

  pub fn contains(&self, month: Month) -> bool {
    self.first <= month && month <= self.last
  }
}

impl IntoIterator for MonthRange {
  type Item = Month;
  type IntoIter = MonthIter;

  fn into_iter(self) -> MonthIter { self.iter() }
}

/// Iterator over the months of a [`MonthRange`], in calendar order.
#[derive(Debug, Clone)]
pub struct MonthIter {
  next: Option<Month>,
  last: Month,
}

impl Iterator for MonthIter {
  type Item = Month;

  fn next(&mut self) -> Option<Month> {
    let current = self.next?;
    self.next = current.succ().filter(|m| *m <= self.last);
    Some(current)
  }
}
