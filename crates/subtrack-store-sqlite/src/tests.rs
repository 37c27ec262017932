//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use subtrack_core::{
  Error as CoreError, aggregate,
  month::Month,
  request::{CreateSubscription, ListParams, TotalParams, UpdateSubscription},
  service::SubscriptionService,
  store::{ListQuery, SubscriptionStore, TotalQuery},
  subscription::{NewSubscription, Patch, SubscriptionPatch},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn service() -> SubscriptionService<SqliteStore> {
  SubscriptionService::new(Arc::new(store().await))
}

fn m(s: &str) -> Month { Month::parse(s).unwrap() }

fn new_sub(
  user_id: Uuid,
  name: &str,
  price: i64,
  start: &str,
  end: Option<&str>,
) -> NewSubscription {
  NewSubscription {
    service_name: name.into(),
    price,
    user_id,
    start_date: m(start),
    end_date: end.map(m),
  }
}

fn total_query(user_id: Uuid, service: Option<&str>, from: &str, to: &str) -> TotalQuery {
  TotalQuery::new(user_id, service.map(str::to_owned), m(from), m(to)).unwrap()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn migrations_set_schema_version() {
  let s = store().await;
  assert_eq!(
    s.schema_version().await.unwrap(),
    crate::schema::MIGRATIONS.len() as i64
  );
}

#[tokio::test]
async fn reopening_a_file_does_not_reapply_migrations() {
  let dir = std::env::temp_dir().join(format!("subtrack-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("store.db");

  let user = Uuid::new_v4();
  let first = SqliteStore::open(&path).await.unwrap();
  let created = first
    .create(new_sub(user, "Netflix", 100, "2024-01", None))
    .await
    .unwrap();
  first.close().await.unwrap();

  let second = SqliteStore::open(&path).await.unwrap();
  assert_eq!(
    second.schema_version().await.unwrap(),
    crate::schema::MIGRATIONS.len() as i64
  );
  assert!(second.get(created.id).await.unwrap().is_some());
  second.close().await.unwrap();

  std::fs::remove_dir_all(&dir).ok();
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_roundtrip() {
  let s = store().await;
  let user = Uuid::new_v4();

  let created = s
    .create(new_sub(user, "Yandex Plus", 400, "2025-07", Some("2025-12")))
    .await
    .unwrap();
  assert_eq!(created.created_at, created.updated_at);

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.service_name, "Yandex Plus");
  assert_eq!(fetched.price, 400);
  assert_eq!(fetched.user_id, user);
  assert_eq!(fetched.start_date, m("2025-07"));
  assert_eq!(fetched.end_date, Some(m("2025-12")));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn non_positive_price_is_rejected_by_schema() {
  let s = store().await;
  let err = s
    .create(new_sub(Uuid::new_v4(), "Free", 0, "2024-01", None))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_applies_patch_and_bumps_updated_at() {
  let s = store().await;
  let created = s
    .create(new_sub(Uuid::new_v4(), "Netflix", 100, "2024-01", Some("2024-03")))
    .await
    .unwrap();

  let updated = s
    .update(
      created.id,
      SubscriptionPatch {
        price: Some(150),
        ..Default::default()
      },
    )
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.price, 150);
  assert_eq!(updated.service_name, "Netflix");
  assert_eq!(updated.end_date, Some(m("2024-03")));
  assert_eq!(updated.created_at, created.created_at);
  assert!(updated.updated_at >= created.updated_at);

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn update_clear_removes_end_date() {
  let s = store().await;
  let created = s
    .create(new_sub(Uuid::new_v4(), "Netflix", 100, "2024-01", Some("2024-03")))
    .await
    .unwrap();

  s.update(
    created.id,
    SubscriptionPatch {
      end_date: Patch::Clear,
      ..Default::default()
    },
  )
  .await
  .unwrap()
  .unwrap();

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.end_date, None);
}

#[tokio::test]
async fn update_missing_returns_none() {
  let s = store().await;
  let result = s
    .update(Uuid::new_v4(), SubscriptionPatch::default())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn concurrent_updates_to_different_fields_both_apply() {
  let s = store().await;
  let created = s
    .create(new_sub(Uuid::new_v4(), "Netflix", 100, "2024-01", Some("2024-03")))
    .await
    .unwrap();

  let price_patch = SubscriptionPatch {
    price: Some(175),
    ..Default::default()
  };
  let name_patch = SubscriptionPatch {
    service_name: Some("Netflix Premium".into()),
    end_date: Patch::Clear,
    ..Default::default()
  };
  let (a, b) = tokio::join!(
    s.update(created.id, price_patch),
    s.update(created.id, name_patch),
  );
  assert!(a.unwrap().is_some());
  assert!(b.unwrap().is_some());

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.price, 175);
  assert_eq!(fetched.service_name, "Netflix Premium");
  assert_eq!(fetched.end_date, None);
  assert_eq!(fetched.start_date, m("2024-01"));
}

#[tokio::test]
async fn update_with_empty_patch_only_touches_updated_at() {
  let s = store().await;
  let created = s
    .create(new_sub(Uuid::new_v4(), "Netflix", 100, "2024-01", Some("2024-03")))
    .await
    .unwrap();

  let updated = s
    .update(created.id, SubscriptionPatch::default())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.service_name, created.service_name);
  assert_eq!(updated.price, created.price);
  assert_eq!(updated.start_date, created.start_date);
  assert_eq!(updated.end_date, created.end_date);
  assert!(updated.updated_at >= created.updated_at);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_hard_and_reports_misses() {
  let s = store().await;
  let created = s
    .create(new_sub(Uuid::new_v4(), "Netflix", 100, "2024-01", None))
    .await
    .unwrap();

  assert!(s.delete(created.id).await.unwrap());
  assert!(s.get(created.id).await.unwrap().is_none());
  assert!(!s.delete(created.id).await.unwrap());
}

// ─── List ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_and_orders_newest_first() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  let a1 = s.create(new_sub(alice, "Netflix", 100, "2024-01", None)).await.unwrap();
  let a2 = s.create(new_sub(alice, "Spotify", 10, "2024-01", None)).await.unwrap();
  let a3 = s.create(new_sub(alice, "Netflix", 120, "2024-06", None)).await.unwrap();
  s.create(new_sub(bob, "Netflix", 100, "2024-01", None)).await.unwrap();

  let all = s.list(&ListQuery::default()).await.unwrap();
  assert_eq!(all.len(), 4);

  let alices = s
    .list(&ListQuery {
      user_id: Some(alice),
      ..Default::default()
    })
    .await
    .unwrap();
  let ids: Vec<_> = alices.iter().map(|x| x.id).collect();
  assert_eq!(ids, [a3.id, a2.id, a1.id]);

  let netflix = s
    .list(&ListQuery {
      user_id: Some(alice),
      service_name: Some("Netflix".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(netflix.len(), 2);
  assert!(netflix.iter().all(|x| x.service_name == "Netflix"));
}

#[tokio::test]
async fn list_paginates() {
  let s = store().await;
  let user = Uuid::new_v4();
  for price in 1..=5 {
    s.create(new_sub(user, "Svc", price, "2024-01", None)).await.unwrap();
  }

  let page = s
    .list(&ListQuery {
      limit: 2,
      offset: 1,
      ..Default::default()
    })
    .await
    .unwrap();
  let prices: Vec<_> = page.iter().map(|x| x.price).collect();
  assert_eq!(prices, [4, 3]);

  let past_end = s
    .list(&ListQuery {
      offset: 10,
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(past_end.is_empty());
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn aggregate_month_range_cases() {
  let s = store().await;
  let user = Uuid::new_v4();
  s.create(new_sub(user, "Netflix", 100, "2024-01", Some("2024-03")))
    .await
    .unwrap();

  let cases = [
    ("2024-01", "2024-12", 300),
    ("2024-02", "2024-02", 100),
    ("2024-03", "2024-03", 100),
    ("2024-04", "2024-12", 0),
    ("2023-01", "2023-12", 0),
  ];
  for (from, to, expected) in cases {
    let total = s
      .aggregate_total(&total_query(user, None, from, to))
      .await
      .unwrap();
    assert_eq!(total, expected, "{from}..={to}");
  }
}

#[tokio::test]
async fn aggregate_open_ended_clamps_to_window() {
  let s = store().await;
  let user = Uuid::new_v4();
  s.create(new_sub(user, "Spotify", 250, "2023-06", None))
    .await
    .unwrap();

  let total = s
    .aggregate_total(&total_query(user, None, "2024-01", "2024-03"))
    .await
    .unwrap();
  assert_eq!(total, 750);
}

#[tokio::test]
async fn aggregate_filters_by_user_and_service() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();
  s.create(new_sub(alice, "Netflix", 100, "2024-01", None)).await.unwrap();
  s.create(new_sub(alice, "Spotify", 10, "2024-01", None)).await.unwrap();
  s.create(new_sub(bob, "Netflix", 1000, "2024-01", None)).await.unwrap();

  let all = s
    .aggregate_total(&total_query(alice, None, "2024-01", "2024-02"))
    .await
    .unwrap();
  assert_eq!(all, 220);

  let netflix = s
    .aggregate_total(&total_query(alice, Some("Netflix"), "2024-01", "2024-02"))
    .await
    .unwrap();
  assert_eq!(netflix, 200);
}

#[tokio::test]
async fn aggregate_agrees_with_engine_over_full_listing() {
  let s = store().await;
  let user = Uuid::new_v4();
  let fixtures = [
    ("A", 100, "2023-06", None),
    ("B", 35, "2024-02", Some("2024-02")),
    ("C", 12, "2024-11", Some("2025-04")),
    ("D", 7, "2025-09", None),
    ("E", 50, "2024-06", Some("2024-01")),
  ];
  for (name, price, start, end) in fixtures {
    s.create(new_sub(user, name, price, start, end)).await.unwrap();
  }
  let everything = s
    .list(&ListQuery {
      limit: u32::MAX,
      ..Default::default()
    })
    .await
    .unwrap();

  let mut from = m("2023-01");
  while from <= m("2025-12") {
    let to = m("2025-12");
    let q = TotalQuery::new(user, None, from, to).unwrap();
    let expected = aggregate::total_cost(&everything, &q).unwrap();
    assert_eq!(s.aggregate_total(&q).await.unwrap(), expected, "from {from}");
    from = from.succ().unwrap();
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

fn create_body(user_id: Uuid) -> CreateSubscription {
  CreateSubscription {
    service_name: "Netflix".into(),
    price:        100,
    user_id:      user_id.to_string(),
    start_date:   "2024-01".into(),
    end_date:     Some("2024-03".into()),
  }
}

#[tokio::test]
async fn service_create_then_get_roundtrip() {
  let svc = service().await;
  let user = Uuid::new_v4();

  let created = svc.create(create_body(user)).await.unwrap();
  let fetched = svc.get(created.id).await.unwrap();

  assert_eq!(fetched.service_name, "Netflix");
  assert_eq!(fetched.price, 100);
  assert_eq!(fetched.user_id, user);
  assert_eq!(fetched.start_date, m("2024-01"));
  assert_eq!(fetched.end_date, Some(m("2024-03")));
}

#[tokio::test]
async fn service_create_validation_error() {
  let svc = service().await;
  let err = svc
    .create(CreateSubscription {
      price: 0,
      ..create_body(Uuid::new_v4())
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn service_update_end_date_clear_vs_omit() {
  let svc = service().await;
  let created = svc.create(create_body(Uuid::new_v4())).await.unwrap();

  let omitted = svc
    .update(
      created.id,
      UpdateSubscription {
        price: Some(200),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(omitted.end_date, Some(m("2024-03")));
  assert_eq!(omitted.price, 200);

  let cleared = svc
    .update(
      created.id,
      UpdateSubscription {
        end_date: Some(String::new()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(cleared.end_date, None);
  assert_eq!(svc.get(created.id).await.unwrap().end_date, None);
}

#[tokio::test]
async fn service_update_missing_is_not_found() {
  let svc = service().await;
  let id = Uuid::new_v4();
  let err = svc
    .update(id, UpdateSubscription::default())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound(missing) if missing == id));
}

#[tokio::test]
async fn service_delete_twice_fails_second_time() {
  let svc = service().await;
  let created = svc.create(create_body(Uuid::new_v4())).await.unwrap();

  svc.delete(created.id).await.unwrap();
  let err = svc.delete(created.id).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));

  let err = svc.get(created.id).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn service_delete_unknown_is_not_found() {
  let svc = service().await;
  let err = svc.delete(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn service_list_uses_defaults() {
  let svc = service().await;
  let user = Uuid::new_v4();
  for _ in 0..3 {
    svc.create(create_body(user)).await.unwrap();
  }
  let items = svc
    .list(ListParams {
      user_id: Some(user.to_string()),
      limit: Some("not-a-number".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn service_total_rejects_inverted_range_regardless_of_data() {
  let svc = service().await;
  let user = Uuid::new_v4();
  svc.create(create_body(user)).await.unwrap();

  let err = svc
    .total(TotalParams {
      user_id: Some(user.to_string()),
      service_name: None,
      from: Some("2024-12".into()),
      to: Some("2024-01".into()),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Validation(ref msg) if msg == "from must be <= to"));
}

#[tokio::test]
async fn service_total_sums_months() {
  let svc = service().await;
  let user = Uuid::new_v4();
  svc.create(create_body(user)).await.unwrap();

  let total = svc
    .total(TotalParams {
      user_id: Some(user.to_string()),
      service_name: Some("Netflix".into()),
      from: Some("2024-01".into()),
      to: Some("2024-12".into()),
    })
    .await
    .unwrap();
  assert_eq!(total, 300);
}
