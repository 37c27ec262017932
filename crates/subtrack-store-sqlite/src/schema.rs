//! SQL schema for the subscription store.
//!
//! Migrations are numbered by their position in [`MIGRATIONS`] and gated on
//! `PRAGMA user_version`: a database at version `n` has had the first `n`
//! entries applied. Append new steps; never edit an applied one.

/// Connection-level settings, applied on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

pub const MIGRATIONS: &[&str] = &[
  // 1: subscriptions table.
  "
CREATE TABLE IF NOT EXISTS subscriptions (
    id            TEXT PRIMARY KEY,
    service_name  TEXT NOT NULL,
    price         INTEGER NOT NULL CHECK (price > 0),
    user_id       TEXT NOT NULL,
    start_date    TEXT NOT NULL,   -- YYYY-MM-01
    end_date      TEXT,            -- YYYY-MM-01, last active month; NULL = open-ended
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subscriptions_user_idx    ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS subscriptions_created_idx ON subscriptions(created_at);
",
];
