//! Subscription revenue metrics and repository trait.
//!
//! Read-only aggregates over the `subscriptions` and `subscription_events`
//! tables. Prices live outside the database and are passed in as a map from
//! Stripe price ID to monthly value.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Monthly value per Stripe price ID. Unknown prices contribute nothing.
pub type PriceMap = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDistribution {
    pub plan_id: String,
    pub plan_name: String,
    pub subscribers: i64,

    /// Share of all active subscribers, 0 to 100
    pub percentage: f64,
}

/// Retention of subscribers who joined in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRetention {
    /// `YYYY-MM`
    pub cohort_month: String,
    pub initial_size: i64,

    /// Percentage of the cohort at each months-retained index
    pub retention_rates: Vec<f64>,
}

/// One aggregated cohort row: how many of a cohort stayed `months_retained` months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortCell {
    pub cohort_month: DateTime<Utc>,
    pub initial_size: i64,
    pub months_retained: Option<i32>,
    pub retained_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberGrowth {
    /// `YYYY-MM`
    pub month: String,

    /// Running total of net change across the window
    pub total: i64,

    pub new: i64,
    pub churned: i64,
    pub net_change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueByMonth {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: f64,
    pub mrr: f64,
}

/// Repository trait for revenue analytics.
#[async_trait]
pub trait RevenueRepository: Send + Sync {
    /// Monthly recurring revenue of active and trialing pro subscriptions.
    async fn mrr(&self, prices: &PriceMap) -> Result<f64, AppError>;

    async fn active_subscriber_count(&self) -> Result<i64, AppError>;

    async fn churned_subscriber_count(&self, since: DateTime<Utc>) -> Result<i64, AppError>;

    async fn new_subscriber_count(&self, since: DateTime<Utc>) -> Result<i64, AppError>;

    async fn plan_distribution(&self) -> Result<Vec<PlanDistribution>, AppError>;

    /// Cohorts from the last `months` months, oldest first.
    async fn cohort_retention(&self, months: i32) -> Result<Vec<CohortRetention>, AppError>;

    /// New and churned subscribers per month with a running total, oldest first.
    async fn subscriber_growth(&self, months: i32) -> Result<Vec<SubscriberGrowth>, AppError>;

    /// Percentage of trials since `since` that converted to active.
    async fn trial_conversion_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError>;

    /// Percentage of subscriptions that entered a grace period and recovered.
    async fn grace_period_recovery_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError>;

    /// Paid invoice revenue per month, oldest first.
    async fn revenue_by_month(&self, months: i32, prices: &PriceMap) -> Result<Vec<RevenueByMonth>, AppError>;

    /// Revenue across every paid invoice.
    async fn total_revenue(&self, prices: &PriceMap) -> Result<f64, AppError>;
}
