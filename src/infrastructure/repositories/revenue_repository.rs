//! Revenue Repository Implementation
//!
//! PostgreSQL implementation of the RevenueRepository trait.
//! Every metric is scoped to `pro` tier subscriptions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::services::{CohortService, SECONDS_PER_MONTH};
use crate::domain::{
    CohortCell, CohortRetention, PlanDistribution, PriceMap, RevenueByMonth, RevenueRepository,
    SubscriberGrowth,
};
use crate::shared::error::AppError;

const UNKNOWN_PLAN: &str = "Unknown";

/// Subscription count for one Stripe price.
#[derive(Debug, sqlx::FromRow)]
struct PriceCountRow {
    stripe_price_id: Option<String>,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CohortRow {
    cohort_month: DateTime<Utc>,
    initial_size: i64,
    months_retained: Option<i32>,
    retained_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct GrowthRow {
    month: DateTime<Utc>,
    new_subscribers: i64,
    churned_subscribers: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthlyPriceCountRow {
    month: DateTime<Utc>,
    stripe_price_id: Option<String>,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RateRow {
    total: i64,
    matched: i64,
}

/// Sum of monthly value times count over rows with a known price.
fn priced_total<'a>(rows: impl IntoIterator<Item = (Option<&'a str>, i64)>, prices: &PriceMap) -> f64 {
    rows.into_iter()
        .filter_map(|(price_id, count)| {
            price_id
                .and_then(|id| prices.get(id))
                .map(|monthly| monthly * count as f64)
        })
        .sum()
}

/// Fill in percentages of the total subscriber count.
fn with_percentages(rows: Vec<PriceCountRow>) -> Vec<PlanDistribution> {
    let total: i64 = rows.iter().map(|r| r.count).sum();

    rows.into_iter()
        .map(|row| {
            let plan = row.stripe_price_id.unwrap_or_else(|| UNKNOWN_PLAN.to_string());
            PlanDistribution {
                plan_id: plan.clone(),
                plan_name: plan,
                subscribers: row.count,
                percentage: CohortService::rate(row.count, total),
            }
        })
        .collect()
}

/// Running totals of net subscriber change, in month order.
fn running_growth(rows: Vec<GrowthRow>) -> Vec<SubscriberGrowth> {
    let mut total = 0;

    rows.into_iter()
        .map(|row| {
            let net_change = row.new_subscribers - row.churned_subscribers;
            total += net_change;
            SubscriberGrowth {
                month: row.month.format("%Y-%m").to_string(),
                total,
                new: row.new_subscribers,
                churned: row.churned_subscribers,
                net_change,
            }
        })
        .collect()
}

/// PostgreSQL revenue repository implementation.
#[derive(Clone)]
pub struct PgRevenueRepository {
    pool: PgPool,
}

impl PgRevenueRepository {
    /// Create a new PgRevenueRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &'static str, since: Option<DateTime<Utc>>) -> Result<i64, AppError> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(since) = since {
            query = query.bind(since);
        }

        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn rate(&self, sql: &'static str, since: DateTime<Utc>) -> Result<f64, AppError> {
        let row = sqlx::query_as::<_, RateRow>(sql)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(CohortService::rate(row.matched, row.total))
    }
}

#[async_trait]
impl RevenueRepository for PgRevenueRepository {
    async fn mrr(&self, prices: &PriceMap) -> Result<f64, AppError> {
        let rows = sqlx::query_as::<_, PriceCountRow>(
            r#"
            SELECT stripe_price_id, COUNT(*) AS count
            FROM subscriptions
            WHERE status IN ('active', 'trialing') AND tier = 'pro'
            GROUP BY stripe_price_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(priced_total(
            rows.iter().map(|r| (r.stripe_price_id.as_deref(), r.count)),
            prices,
        ))
    }

    async fn active_subscriber_count(&self) -> Result<i64, AppError> {
        self.count(
            "SELECT COUNT(*) FROM subscriptions WHERE status IN ('active', 'trialing') AND tier = 'pro'",
            None,
        )
        .await
    }

    async fn churned_subscriber_count(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        self.count(
            "SELECT COUNT(*) FROM subscriptions \
             WHERE status = 'canceled' AND canceled_at >= $1 AND tier = 'pro'",
            Some(since),
        )
        .await
    }

    async fn new_subscriber_count(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        self.count(
            "SELECT COUNT(*) FROM subscriptions \
             WHERE created_at >= $1 AND tier = 'pro' AND status IN ('active', 'trialing', 'canceled')",
            Some(since),
        )
        .await
    }

    async fn plan_distribution(&self) -> Result<Vec<PlanDistribution>, AppError> {
        let rows = sqlx::query_as::<_, PriceCountRow>(
            r#"
            SELECT stripe_price_id, COUNT(*) AS count
            FROM subscriptions
            WHERE status IN ('active', 'trialing')
              AND tier = 'pro'
              AND stripe_price_id IS NOT NULL
            GROUP BY stripe_price_id
            ORDER BY count DESC, stripe_price_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(with_percentages(rows))
    }

    async fn cohort_retention(&self, months: i32) -> Result<Vec<CohortRetention>, AppError> {
        let rows = sqlx::query_as::<_, CohortRow>(
            r#"
            WITH cohorts AS (
                SELECT DATE_TRUNC('month', created_at) AS cohort_month, status, canceled_at
                FROM subscriptions
                WHERE tier = 'pro' AND created_at >= NOW() - make_interval(months => $1)
            ),
            cohort_sizes AS (
                SELECT cohort_month, COUNT(*) AS initial_size
                FROM cohorts
                GROUP BY cohort_month
            ),
            retained AS (
                SELECT
                    cohort_month,
                    FLOOR(EXTRACT(EPOCH FROM (COALESCE(canceled_at, NOW()) - cohort_month)) / $2)::INT AS months_retained
                FROM cohorts
                WHERE status IN ('active', 'trialing', 'canceled')
            )
            SELECT cs.cohort_month, cs.initial_size, r.months_retained, COUNT(r.cohort_month) AS retained_count
            FROM cohort_sizes cs
            LEFT JOIN retained r ON cs.cohort_month = r.cohort_month
            GROUP BY cs.cohort_month, cs.initial_size, r.months_retained
            ORDER BY cs.cohort_month, r.months_retained
            "#,
        )
        .bind(months)
        .bind(SECONDS_PER_MONTH as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(CohortService::assemble(rows.into_iter().map(|row| CohortCell {
            cohort_month: row.cohort_month,
            initial_size: row.initial_size,
            months_retained: row.months_retained,
            retained_count: row.retained_count,
        })))
    }

    async fn subscriber_growth(&self, months: i32) -> Result<Vec<SubscriberGrowth>, AppError> {
        let rows = sqlx::query_as::<_, GrowthRow>(
            r#"
            WITH monthly_data AS (
                SELECT DATE_TRUNC('month', created_at) AS month, COUNT(*) AS new_subscribers
                FROM subscriptions
                WHERE tier = 'pro' AND created_at >= NOW() - make_interval(months => $1)
                GROUP BY 1
            ),
            churned_data AS (
                SELECT DATE_TRUNC('month', canceled_at) AS month, COUNT(*) AS churned_subscribers
                FROM subscriptions
                WHERE tier = 'pro'
                  AND canceled_at IS NOT NULL
                  AND canceled_at >= NOW() - make_interval(months => $1)
                GROUP BY 1
            )
            SELECT
                COALESCE(m.month, c.month) AS month,
                COALESCE(m.new_subscribers, 0) AS new_subscribers,
                COALESCE(c.churned_subscribers, 0) AS churned_subscribers
            FROM monthly_data m
            FULL OUTER JOIN churned_data c ON m.month = c.month
            ORDER BY month
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;

        Ok(running_growth(rows))
    }

    async fn trial_conversion_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError> {
        self.rate(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE trial_start IS NOT NULL) AS total,
                COUNT(*) FILTER (WHERE trial_start IS NOT NULL AND status = 'active') AS matched
            FROM subscriptions
            WHERE tier = 'pro' AND created_at >= $1
            "#,
            since,
        )
        .await
    }

    async fn grace_period_recovery_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError> {
        self.rate(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE grace_period_end IS NOT NULL) AS total,
                COUNT(*) FILTER (WHERE grace_period_end IS NOT NULL AND status = 'active') AS matched
            FROM subscriptions
            WHERE tier = 'pro' AND updated_at >= $1
            "#,
            since,
        )
        .await
    }

    async fn revenue_by_month(&self, months: i32, prices: &PriceMap) -> Result<Vec<RevenueByMonth>, AppError> {
        let rows = sqlx::query_as::<_, MonthlyPriceCountRow>(
            r#"
            SELECT DATE_TRUNC('month', se.created_at) AS month, s.stripe_price_id, COUNT(*) AS count
            FROM subscription_events se
            JOIN subscriptions s ON se.subscription_id = s.id
            WHERE se.event_type = 'invoice_paid'
              AND se.created_at >= NOW() - make_interval(months => $1)
            GROUP BY 1, 2
            ORDER BY 1
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;

        let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
        for row in &rows {
            let revenue = priced_total([(row.stripe_price_id.as_deref(), row.count)], prices);
            *monthly.entry(row.month.format("%Y-%m").to_string()).or_default() += revenue;
        }

        // MRR is approximated by the month's invoiced revenue.
        Ok(monthly
            .into_iter()
            .map(|(month, revenue)| RevenueByMonth { month, revenue, mrr: revenue })
            .collect())
    }

    async fn total_revenue(&self, prices: &PriceMap) -> Result<f64, AppError> {
        let rows = sqlx::query_as::<_, PriceCountRow>(
            r#"
            SELECT s.stripe_price_id, COUNT(*) AS count
            FROM subscription_events se
            JOIN subscriptions s ON se.subscription_id = s.id
            WHERE se.event_type = 'invoice_paid'
            GROUP BY s.stripe_price_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(priced_total(
            rows.iter().map(|r| (r.stripe_price_id.as_deref(), r.count)),
            prices,
        ))
    }
}
