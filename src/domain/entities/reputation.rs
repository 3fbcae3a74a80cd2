//! Reputation entities and repository trait.
//!
//! Karma, badges, activity counters and trust scores. Counters in
//! `user_stats` are derived from raw activity and recomputed on demand.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::UserSummary;
use crate::shared::error::AppError;

/// Ceiling of the trust score.
pub const MAX_TRUST_SCORE: i64 = 100;

/// One karma change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KarmaHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,

    /// `clip_vote`, `comment_vote` or another awarding source
    pub source: String,

    pub source_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Karma totals by source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaBreakdown {
    pub clip_karma: i64,
    pub comment_karma: i64,
    pub total_karma: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_id: String,
    pub awarded_at: DateTime<Utc>,

    /// `None` for automatic awards
    pub awarded_by: Option<Uuid>,
}

/// Aggregated activity counters for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub trust_score: i32,
    pub engagement_score: i32,
    pub total_comments: i32,
    pub total_votes_cast: i32,
    pub total_clips_submitted: i32,
    pub correct_reports: i32,
    pub incorrect_reports: i32,
    pub days_active: i32,
    pub last_active_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// Zeroed counters, used when a user has no stats row yet.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            trust_score: 0,
            engagement_score: 0,
            total_comments: 0,
            total_votes_cast: 0,
            total_clips_submitted: 0,
            correct_reports: 0,
            incorrect_reports: 0,
            days_active: 0,
            last_active_date: None,
            updated_at: Utc::now(),
        }
    }
}

/// Activity counters that `increment_activity` can bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Comment,
    Vote,
    Submission,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Vote => "vote",
            Self::Submission => "submission",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(Self::Comment),
            "vote" => Ok(Self::Vote),
            "submission" => Ok(Self::Submission),
            other => Err(AppError::BadRequest(format!("Unknown activity type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardKind {
    Karma,
    Engagement,
    TrustScore,
}

/// A ranked user. `rank` is 1-based across pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user: UserSummary,
    pub score: i64,
    pub total_comments: Option<i32>,
    pub total_votes_cast: Option<i32>,
    pub total_clips_submitted: Option<i32>,
}

/// Raw counters a trust score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScoreInputs {
    pub account_age_days: i64,
    pub karma_points: i64,
    pub correct_reports: i64,
    pub incorrect_reports: i64,
    pub total_comments: i64,
    pub total_votes: i64,
    pub days_active: i64,
    pub is_banned: bool,
}

/// A trust score with its component contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScoreBreakdown {
    pub total_score: i64,
    pub account_age_score: i64,
    pub karma_score: i64,
    pub report_accuracy: i64,
    pub activity_score: i64,
    pub max_score: i64,

    /// 0.5 when the user is banned, 0 otherwise
    pub ban_penalty: f64,

    #[serde(flatten)]
    pub inputs: TrustScoreInputs,
}

impl TrustScoreBreakdown {
    /// Component scores keyed for the history log.
    pub fn component_scores(&self) -> HashMap<String, serde_json::Value> {
        HashMap::from([
            ("account_age".to_string(), self.account_age_score.into()),
            ("karma".to_string(), self.karma_score.into()),
            ("report_accuracy".to_string(), self.report_accuracy.into()),
            ("activity".to_string(), self.activity_score.into()),
        ])
    }
}

/// One recorded trust score change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScoreHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub old_score: Option<i32>,
    pub new_score: i32,
    pub change_reason: String,
    pub component_scores: Option<HashMap<String, serde_json::Value>>,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arguments for `update_trust_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustScoreUpdate {
    pub new_score: i32,
    pub reason: String,
    pub component_scores: Option<HashMap<String, serde_json::Value>>,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
}

impl TrustScoreUpdate {
    /// Update carrying a breakdown's total and components.
    pub fn from_breakdown(breakdown: &TrustScoreBreakdown, reason: impl Into<String>) -> Self {
        Self {
            new_score: breakdown.total_score as i32,
            reason: reason.into(),
            component_scores: Some(breakdown.component_scores()),
            changed_by: None,
            notes: None,
        }
    }
}

/// Repository trait for karma, badges and trust.
#[async_trait]
pub trait ReputationRepository: Send + Sync {
    /// Karma changes newest first.
    async fn karma_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<KarmaHistory>, AppError>;

    async fn karma_breakdown(&self, user_id: Uuid) -> Result<KarmaBreakdown, AppError>;

    /// Badges newest first.
    async fn badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, AppError>;

    /// Award a badge. Returns `false` if the user already held it.
    async fn award_badge(
        &self,
        user_id: Uuid,
        badge_id: &str,
        awarded_by: Option<Uuid>,
    ) -> Result<bool, AppError>;

    /// Returns `false` if the user did not hold the badge.
    async fn remove_badge(&self, user_id: Uuid, badge_id: &str) -> Result<bool, AppError>;

    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>, AppError>;

    async fn upsert_user_stats(&self, stats: &UserStats) -> Result<(), AppError>;

    /// Trust score as computed by the database function.
    async fn trust_score(&self, user_id: Uuid) -> Result<i32, AppError>;

    /// Engagement score as computed by the database function.
    async fn engagement_score(&self, user_id: Uuid) -> Result<i32, AppError>;

    /// Bump one activity counter and recompute days active.
    async fn increment_activity(&self, user_id: Uuid, kind: ActivityKind, count: i32) -> Result<(), AppError>;

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError>;

    /// Award every automatic badge the user qualifies for. Returns the badges
    /// newly awarded by this call.
    async fn check_and_award_badges(&self, user_id: Uuid) -> Result<Vec<&'static str>, AppError>;

    /// Compute the trust score from stored counters. Unknown users are `NotFound`.
    async fn trust_score_breakdown(&self, user_id: Uuid) -> Result<TrustScoreBreakdown, AppError>;

    /// Store a new trust score and log the change.
    async fn update_trust_score(&self, user_id: Uuid, update: &TrustScoreUpdate) -> Result<(), AppError>;

    /// Trust score changes newest first.
    async fn trust_score_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<TrustScoreHistory>, AppError>;
}
