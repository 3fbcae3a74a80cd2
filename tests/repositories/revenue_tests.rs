//! Revenue metric tests
//!
//! Revenue aggregates span the whole `subscriptions` table, so these tests
//! take a shared lock and start from empty tables.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use clip_repository::domain::services::SECONDS_PER_MONTH;
use clip_repository::domain::{PriceMap, RevenueRepository};
use clip_repository::infrastructure::repositories::PgRevenueRepository;

use crate::common::{insert_user, test_pool};

static SUBSCRIPTION_TABLES: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

async fn exclusive_tables(pool: &PgPool) -> MutexGuard<'static, ()> {
    let guard = SUBSCRIPTION_TABLES.lock().await;
    sqlx::query("TRUNCATE subscription_events, subscriptions")
        .execute(pool)
        .await
        .expect("reset subscriptions");
    guard
}

fn prices() -> PriceMap {
    PriceMap::from([
        ("price_monthly".to_string(), 9.99),
        ("price_yearly".to_string(), 7.5),
    ])
}

fn approx(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
}

async fn insert_subscription(pool: &PgPool, tier: &str, status: &str, price: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    let user_id = insert_user(pool, 0, 1).await;

    sqlx::query(
        "INSERT INTO subscriptions (id, user_id, tier, status, stripe_price_id) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(user_id)
    .bind(tier)
    .bind(status)
    .bind(price)
    .execute(pool)
    .await
    .expect("insert subscription");

    id
}

async fn set_column(pool: &PgPool, id: Uuid, column: &str) {
    sqlx::query(&format!("UPDATE subscriptions SET {} = NOW() WHERE id = $1", column))
        .bind(id)
        .execute(pool)
        .await
        .expect("update subscription");
}

async fn insert_event(pool: &PgPool, subscription_id: Uuid, event_type: &str) {
    sqlx::query("INSERT INTO subscription_events (subscription_id, event_type) VALUES ($1, $2)")
        .bind(subscription_id)
        .bind(event_type)
        .execute(pool)
        .await
        .expect("insert subscription event");
}

/// Move a subscription into the cohort three months back, canceled
/// `cancel_after` seconds after the cohort starts.
async fn place_in_cohort(pool: &PgPool, id: Uuid, cancel_after: Option<i64>) {
    sqlx::query(
        r#"
        UPDATE subscriptions
        SET created_at = DATE_TRUNC('month', NOW() - INTERVAL '3 months') + INTERVAL '1 hour',
            canceled_at = DATE_TRUNC('month', NOW() - INTERVAL '3 months') + make_interval(secs => $2)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(cancel_after.map(|secs| secs as f64))
    .execute(pool)
    .await
    .expect("place subscription in cohort");
}

#[tokio::test]
async fn test_cohort_buckets_by_average_month() {
    let Some(pool) = test_pool().await else { return };
    let _tables = exclusive_tables(&pool).await;
    let repo = PgRevenueRepository::new(pool.clone());

    for cancel_after in [SECONDS_PER_MONTH - 1, SECONDS_PER_MONTH, SECONDS_PER_MONTH * 2 + 60] {
        let id = insert_subscription(&pool, "pro", "canceled", Some("price_monthly")).await;
        place_in_cohort(&pool, id, Some(cancel_after)).await;
    }
    let lapsed = insert_subscription(&pool, "pro", "past_due", Some("price_monthly")).await;
    place_in_cohort(&pool, lapsed, None).await;
    let free = insert_subscription(&pool, "free", "canceled", None).await;
    place_in_cohort(&pool, free, Some(SECONDS_PER_MONTH)).await;

    let cohorts = repo.cohort_retention(6).await.unwrap();

    assert_eq!(cohorts.len(), 1);
    assert_eq!(cohorts[0].initial_size, 4);
    assert_eq!(cohorts[0].retention_rates, vec![25.0, 25.0, 25.0]);
}

#[tokio::test]
async fn test_cohort_window_excludes_older_signups() {
    let Some(pool) = test_pool().await else { return };
    let _tables = exclusive_tables(&pool).await;
    let repo = PgRevenueRepository::new(pool.clone());

    let id = insert_subscription(&pool, "pro", "canceled", Some("price_monthly")).await;
    place_in_cohort(&pool, id, Some(SECONDS_PER_MONTH)).await;

    assert!(repo.cohort_retention(1).await.unwrap().is_empty());
    assert_eq!(repo.cohort_retention(12).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscription_metrics() {
    let Some(pool) = test_pool().await else { return };
    let _tables = exclusive_tables(&pool).await;
    let repo = PgRevenueRepository::new(pool.clone());

    let converted = insert_subscription(&pool, "pro", "active", Some("price_monthly")).await;
    set_column(&pool, converted, "trial_start").await;
    let monthly = insert_subscription(&pool, "pro", "active", Some("price_monthly")).await;
    let trialing = insert_subscription(&pool, "pro", "trialing", Some("price_yearly")).await;
    set_column(&pool, trialing, "trial_start").await;
    let canceled = insert_subscription(&pool, "pro", "canceled", Some("price_monthly")).await;
    set_column(&pool, canceled, "canceled_at").await;
    insert_subscription(&pool, "free", "active", Some("price_monthly")).await;
    let past_due = insert_subscription(&pool, "pro", "past_due", Some("price_yearly")).await;
    set_column(&pool, past_due, "grace_period_end").await;
    let recovered = insert_subscription(&pool, "pro", "active", Some("price_yearly")).await;
    set_column(&pool, recovered, "grace_period_end").await;

    let day_ago = Utc::now() - Duration::days(1);

    assert_eq!(repo.active_subscriber_count().await.unwrap(), 4);
    assert_eq!(repo.churned_subscriber_count(day_ago).await.unwrap(), 1);
    assert_eq!(repo.new_subscriber_count(day_ago).await.unwrap(), 5);
    approx(repo.mrr(&prices()).await.unwrap(), 2.0 * 9.99 + 2.0 * 7.5);
    approx(repo.trial_conversion_rate(day_ago).await.unwrap(), 50.0);
    approx(repo.grace_period_recovery_rate(day_ago).await.unwrap(), 50.0);

    let plans = repo.plan_distribution().await.unwrap();
    let summary: Vec<(&str, i64, f64)> = plans
        .iter()
        .map(|p| (p.plan_id.as_str(), p.subscribers, p.percentage))
        .collect();
    assert_eq!(summary, vec![("price_monthly", 2, 50.0), ("price_yearly", 2, 50.0)]);

    let growth = repo.subscriber_growth(2).await.unwrap();
    let current = growth.last().unwrap();
    assert_eq!(current.new, 6);
    assert_eq!(current.churned, 1);
    assert_eq!(current.net_change, 5);

    insert_event(&pool, converted, "invoice_paid").await;
    insert_event(&pool, converted, "invoice_paid").await;
    insert_event(&pool, trialing, "invoice_paid").await;
    insert_event(&pool, monthly, "payment_failed").await;

    approx(repo.total_revenue(&prices()).await.unwrap(), 2.0 * 9.99 + 7.5);

    let by_month = repo.revenue_by_month(1, &prices()).await.unwrap();
    assert_eq!(by_month.len(), 1);
    approx(by_month[0].revenue, 2.0 * 9.99 + 7.5);
    approx(by_month[0].mrr, by_month[0].revenue);
}

#[tokio::test]
async fn test_rates_without_candidates_are_zero() {
    let Some(pool) = test_pool().await else { return };
    let _tables = exclusive_tables(&pool).await;
    let repo = PgRevenueRepository::new(pool.clone());

    insert_subscription(&pool, "pro", "active", Some("price_monthly")).await;
    let day_ago = Utc::now() - Duration::days(1);

    approx(repo.trial_conversion_rate(day_ago).await.unwrap(), 0.0);
    approx(repo.grace_period_recovery_rate(day_ago).await.unwrap(), 0.0);
    approx(repo.total_revenue(&prices()).await.unwrap(), 0.0);
}
