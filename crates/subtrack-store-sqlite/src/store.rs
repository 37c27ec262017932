//! [`SqliteStore`], the SQLite implementation of [`SubscriptionStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use subtrack_core::{
  aggregate,
  store::{ListQuery, SubscriptionStore, TotalQuery},
  subscription::{NewSubscription, Patch, Subscription, SubscriptionPatch},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{COLUMNS, RawSubscription, encode_dt, encode_month, encode_uuid, now},
  schema::{MIGRATIONS, PRAGMAS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Clones share the same background connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Close the background connection, flushing any pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// The schema version currently recorded in the database.
  pub async fn schema_version(&self) -> Result<i64> {
    let version: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;
    Ok(version)
  }

  /// Apply every migration newer than the database's `user_version`, each in
  /// its own transaction.
  async fn migrate(&self) -> Result<()> {
    let applied: Vec<usize> = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        let current = usize::try_from(current).unwrap_or(0);

        let mut applied = Vec::new();
        for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current) {
          let version = idx + 1;
          let tx = conn.transaction()?;
          tx.execute_batch(sql)?;
          tx.pragma_update(None, "user_version", version as i64)?;
          tx.commit()?;
          applied.push(version);
        }
        Ok(applied)
      })
      .await?;

    for version in applied {
      tracing::info!(version, "applied schema migration");
    }
    Ok(())
  }

  /// Fetch the user's subscriptions that overlap the query window. The
  /// aggregation engine re-checks every condition; this only narrows the scan.
  async fn overlapping(&self, query: &TotalQuery) -> Result<Vec<Subscription>> {
    let user_id = encode_uuid(query.user_id());
    let service_name = query.service_name().map(str::to_owned);
    let from = encode_month(query.from());
    let to = encode_month(query.to());

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM subscriptions
           WHERE user_id = ?1
             AND (?2 IS NULL OR service_name = ?2)
             AND start_date <= ?4
             AND COALESCE(end_date, ?4) >= ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, service_name, from, to],
            RawSubscription::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = crate::Error;

  async fn create(&self, input: NewSubscription) -> Result<Subscription> {
    let at = now();
    let sub = Subscription {
      id:           Uuid::new_v4(),
      service_name: input.service_name,
      price:        input.price,
      user_id:      input.user_id,
      start_date:   input.start_date,
      end_date:     input.end_date,
      created_at:   at,
      updated_at:   at,
    };

    let id_str      = encode_uuid(sub.id);
    let name        = sub.service_name.clone();
    let price       = sub.price;
    let user_id_str = encode_uuid(sub.user_id);
    let start_str   = encode_month(sub.start_date);
    let end_str     = sub.end_date.map(encode_month);
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             id, service_name, price, user_id, start_date, end_date,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, name, price, user_id_str, start_str, end_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(sub)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?1"),
            rusqlite::params![id_str],
            RawSubscription::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn update(
    &self,
    id:    Uuid,
    patch: SubscriptionPatch,
  ) -> Result<Option<Subscription>> {
    let id_str    = encode_uuid(id);
    let name      = patch.service_name;
    let price     = patch.price;
    let start_str = patch.start_date.map(encode_month);
    let touch_end = !patch.end_date.is_unchanged();
    let end_str   = match patch.end_date {
      Patch::Set(m) => Some(encode_month(m)),
      Patch::Unchanged | Patch::Clear => None,
    };
    let at_str    = encode_dt(now());

    // Each column is patched in place, so concurrent updates that touch
    // different fields all survive.
    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE subscriptions
           SET service_name = COALESCE(?2, service_name),
               price        = COALESCE(?3, price),
               start_date   = COALESCE(?4, start_date),
               end_date     = CASE WHEN ?5 THEN ?6 ELSE end_date END,
               updated_at   = ?7
           WHERE id = ?1",
          rusqlite::params![id_str, name, price, start_str, touch_end, end_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?1"),
          rusqlite::params![id_str],
          RawSubscription::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list(&self, query: &ListQuery) -> Result<Vec<Subscription>> {
    let user_id      = query.user_id.map(encode_uuid);
    let service_name = query.service_name.clone();
    let limit        = i64::from(query.limit);
    let offset       = i64::from(query.offset);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM subscriptions
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR service_name = ?2)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, service_name, limit, offset],
            RawSubscription::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn aggregate_total(&self, query: &TotalQuery) -> Result<i64> {
    let candidates = self.overlapping(query).await?;
    Ok(aggregate::total_cost(&candidates, query)?)
  }
}
