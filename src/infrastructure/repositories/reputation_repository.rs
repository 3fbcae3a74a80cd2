//! Reputation Repository Implementation
//!
//! PostgreSQL implementation of the ReputationRepository trait.
//! Trust and engagement scores are owned by database functions; the
//! breakdown is recomputed here from the same counters.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::services::{BadgeService, TrustScoreService};
use crate::domain::{
    ActivityKind, KarmaBreakdown, KarmaHistory, LeaderboardEntry, LeaderboardKind,
    ReputationRepository, TrustScoreBreakdown, TrustScoreHistory, TrustScoreInputs,
    TrustScoreUpdate, UserBadge, UserStats,
};
use crate::infrastructure::repositories::user_row::UserSummaryRow;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

macro_rules! user_stats_columns {
    () => {
        "user_id, trust_score, engagement_score, total_comments, total_votes_cast, \
         total_clips_submitted, correct_reports, incorrect_reports, days_active, \
         last_active_date, updated_at"
    };
}

/// Ranked users by `$score`, with their activity counters.
macro_rules! leaderboard_sql {
    ($score:literal, $from:literal) => {
        concat!(
            "SELECT ",
            user_summary_columns!(),
            ", ",
            $score,
            " AS score, us.total_comments, us.total_votes_cast, us.total_clips_submitted ",
            $from,
            " WHERE u.is_banned = false ORDER BY score DESC, u.id LIMIT $1 OFFSET $2"
        )
    };
}

const KARMA_LEADERBOARD: &str = leaderboard_sql!(
    "u.karma_points::BIGINT",
    "FROM users u LEFT JOIN user_stats us ON us.user_id = u.id"
);

const ENGAGEMENT_LEADERBOARD: &str = leaderboard_sql!(
    "us.engagement_score::BIGINT",
    "FROM user_stats us JOIN users u ON u.id = us.user_id"
);

const TRUST_LEADERBOARD: &str = leaderboard_sql!(
    "us.trust_score::BIGINT",
    "FROM user_stats us JOIN users u ON u.id = us.user_id"
);

/// Database row representation for the `karma_history` table.
#[derive(Debug, sqlx::FromRow)]
struct KarmaHistoryRow {
    id: Uuid,
    user_id: Uuid,
    amount: i32,
    source: String,
    source_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl KarmaHistoryRow {
    fn into_history(self) -> KarmaHistory {
        KarmaHistory {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            source: self.source,
            source_id: self.source_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct KarmaBreakdownRow {
    clip_karma: i64,
    comment_karma: i64,
    total_karma: i64,
}

/// Database row representation for the `user_badges` table.
#[derive(Debug, sqlx::FromRow)]
struct BadgeRow {
    id: Uuid,
    user_id: Uuid,
    badge_id: String,
    awarded_at: DateTime<Utc>,
    awarded_by: Option<Uuid>,
}

impl BadgeRow {
    fn into_badge(self) -> UserBadge {
        UserBadge {
            id: self.id,
            user_id: self.user_id,
            badge_id: self.badge_id,
            awarded_at: self.awarded_at,
            awarded_by: self.awarded_by,
        }
    }
}

/// Database row representation for the `user_stats` table.
#[derive(Debug, sqlx::FromRow)]
struct UserStatsRow {
    user_id: Uuid,
    trust_score: i32,
    engagement_score: i32,
    total_comments: i32,
    total_votes_cast: i32,
    total_clips_submitted: i32,
    correct_reports: i32,
    incorrect_reports: i32,
    days_active: i32,
    last_active_date: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl UserStatsRow {
    fn into_stats(self) -> UserStats {
        UserStats {
            user_id: self.user_id,
            trust_score: self.trust_score,
            engagement_score: self.engagement_score,
            total_comments: self.total_comments,
            total_votes_cast: self.total_votes_cast,
            total_clips_submitted: self.total_clips_submitted,
            correct_reports: self.correct_reports,
            incorrect_reports: self.incorrect_reports,
            days_active: self.days_active,
            last_active_date: self.last_active_date,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    #[sqlx(flatten)]
    user: UserSummaryRow,
    score: Option<i64>,
    total_comments: Option<i32>,
    total_votes_cast: Option<i32>,
    total_clips_submitted: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct TrustInputsRow {
    account_age_days: i64,
    karma_points: i64,
    correct_reports: i64,
    incorrect_reports: i64,
    total_comments: i64,
    total_votes: i64,
    days_active: i64,
    is_banned: bool,
}

/// Database row representation for the `trust_score_history` table.
#[derive(Debug, sqlx::FromRow)]
struct TrustHistoryRow {
    id: Uuid,
    user_id: Uuid,
    old_score: Option<i32>,
    new_score: i32,
    change_reason: String,
    component_scores: Option<Json<HashMap<String, serde_json::Value>>>,
    changed_by: Option<Uuid>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TrustHistoryRow {
    fn into_history(self) -> TrustScoreHistory {
        TrustScoreHistory {
            id: self.id,
            user_id: self.user_id,
            old_score: self.old_score,
            new_score: self.new_score,
            change_reason: self.change_reason,
            component_scores: self.component_scores.map(|Json(scores)| scores),
            changed_by: self.changed_by,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

fn increment_sql(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Comment => {
            "UPDATE user_stats SET total_comments = total_comments + $2, \
             last_active_date = CURRENT_DATE, updated_at = NOW() WHERE user_id = $1"
        }
        ActivityKind::Vote => {
            "UPDATE user_stats SET total_votes_cast = total_votes_cast + $2, \
             last_active_date = CURRENT_DATE, updated_at = NOW() WHERE user_id = $1"
        }
        ActivityKind::Submission => {
            "UPDATE user_stats SET total_clips_submitted = total_clips_submitted + $2, \
             last_active_date = CURRENT_DATE, updated_at = NOW() WHERE user_id = $1"
        }
    }
}

fn leaderboard_query(kind: LeaderboardKind) -> &'static str {
    match kind {
        LeaderboardKind::Karma => KARMA_LEADERBOARD,
        LeaderboardKind::Engagement => ENGAGEMENT_LEADERBOARD,
        LeaderboardKind::TrustScore => TRUST_LEADERBOARD,
    }
}

/// PostgreSQL reputation repository implementation.
#[derive(Clone)]
pub struct PgReputationRepository {
    pool: PgPool,
}

impl PgReputationRepository {
    /// Create a new PgReputationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReputationRepository for PgReputationRepository {
    async fn karma_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<KarmaHistory>, AppError> {
        let window = PageRequest::new(limit, 0);

        let rows = sqlx::query_as::<_, KarmaHistoryRow>(
            r#"
            SELECT id, user_id, amount, source, source_id, created_at
            FROM karma_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(window.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(KarmaHistoryRow::into_history).collect())
    }

    async fn karma_breakdown(&self, user_id: Uuid) -> Result<KarmaBreakdown, AppError> {
        let row = sqlx::query_as::<_, KarmaBreakdownRow>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN source = 'clip_vote' THEN amount ELSE 0 END), 0)::BIGINT AS clip_karma,
                COALESCE(SUM(CASE WHEN source = 'comment_vote' THEN amount ELSE 0 END), 0)::BIGINT AS comment_karma,
                COALESCE(SUM(amount), 0)::BIGINT AS total_karma
            FROM karma_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(KarmaBreakdown {
            clip_karma: row.clip_karma,
            comment_karma: row.comment_karma,
            total_karma: row.total_karma,
        })
    }

    async fn badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, AppError> {
        let rows = sqlx::query_as::<_, BadgeRow>(
            r#"
            SELECT id, user_id, badge_id, awarded_at, awarded_by
            FROM user_badges
            WHERE user_id = $1
            ORDER BY awarded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BadgeRow::into_badge).collect())
    }

    async fn award_badge(
        &self,
        user_id: Uuid,
        badge_id: &str,
        awarded_by: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (id, user_id, badge_id, awarded_by, awarded_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(badge_id)
        .bind(awarded_by)
        .execute(&self.pool)
        .await?;

        let awarded = result.rows_affected() > 0;
        if awarded {
            tracing::debug!(user_id = %user_id, badge_id, "Badge awarded");
        }

        Ok(awarded)
    }

    async fn remove_badge(&self, user_id: Uuid, badge_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_badges WHERE user_id = $1 AND badge_id = $2")
            .bind(user_id)
            .bind(badge_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>, AppError> {
        let row = sqlx::query_as::<_, UserStatsRow>(concat!(
            "SELECT ",
            user_stats_columns!(),
            " FROM user_stats WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserStatsRow::into_stats))
    }

    async fn upsert_user_stats(&self, stats: &UserStats) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (
                user_id, trust_score, engagement_score, total_comments, total_votes_cast,
                total_clips_submitted, correct_reports, incorrect_reports, days_active,
                last_active_date, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                trust_score = EXCLUDED.trust_score,
                engagement_score = EXCLUDED.engagement_score,
                total_comments = EXCLUDED.total_comments,
                total_votes_cast = EXCLUDED.total_votes_cast,
                total_clips_submitted = EXCLUDED.total_clips_submitted,
                correct_reports = EXCLUDED.correct_reports,
                incorrect_reports = EXCLUDED.incorrect_reports,
                days_active = EXCLUDED.days_active,
                last_active_date = EXCLUDED.last_active_date,
                updated_at = NOW()
            "#,
        )
        .bind(stats.user_id)
        .bind(stats.trust_score)
        .bind(stats.engagement_score)
        .bind(stats.total_comments)
        .bind(stats.total_votes_cast)
        .bind(stats.total_clips_submitted)
        .bind(stats.correct_reports)
        .bind(stats.incorrect_reports)
        .bind(stats.days_active)
        .bind(stats.last_active_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn trust_score(&self, user_id: Uuid) -> Result<i32, AppError> {
        let score = sqlx::query_scalar::<_, i32>("SELECT calculate_trust_score($1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(score)
    }

    async fn engagement_score(&self, user_id: Uuid) -> Result<i32, AppError> {
        let score = sqlx::query_scalar::<_, i32>("SELECT calculate_engagement_score($1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(score)
    }

    #[tracing::instrument(skip(self), fields(kind = kind.as_str()))]
    async fn increment_activity(&self, user_id: Uuid, kind: ActivityKind, count: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(increment_sql(kind))
            .bind(user_id)
            .bind(count)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE user_stats
            SET days_active = (
                SELECT COUNT(DISTINCT DATE(created_at))::INT
                FROM karma_history
                WHERE user_id = $1
            )
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn leaderboard(
        &self,
        kind: LeaderboardKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let window = PageRequest::new(limit, offset);

        let rows = sqlx::query_as::<_, LeaderboardRow>(leaderboard_query(kind))
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .zip(window.offset + 1..)
            .map(|(row, rank)| LeaderboardEntry {
                rank,
                user: row.user.into_summary(),
                score: row.score.unwrap_or(0),
                total_comments: row.total_comments,
                total_votes_cast: row.total_votes_cast,
                total_clips_submitted: row.total_clips_submitted,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn check_and_award_badges(&self, user_id: Uuid) -> Result<Vec<&'static str>, AppError> {
        let user = sqlx::query_as::<_, (i32, i64)>(
            "SELECT karma_points, FLOOR(EXTRACT(EPOCH FROM (NOW() - created_at)) / 86400)::BIGINT FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((karma, account_age_days)) = user else {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        };

        let stats = self
            .user_stats(user_id)
            .await?
            .unwrap_or_else(|| UserStats::new(user_id));

        let mut awarded = Vec::new();
        for badge in BadgeService::eligible_badges(karma, account_age_days, &stats) {
            if self.award_badge(user_id, badge, None).await? {
                awarded.push(badge);
            }
        }

        Ok(awarded)
    }

    async fn trust_score_breakdown(&self, user_id: Uuid) -> Result<TrustScoreBreakdown, AppError> {
        let row = sqlx::query_as::<_, TrustInputsRow>(
            r#"
            SELECT
                u.karma_points::BIGINT AS karma_points,
                u.is_banned,
                EXTRACT(EPOCH FROM (NOW() - u.created_at))::BIGINT / 86400 AS account_age_days,
                COALESCE(us.correct_reports, 0)::BIGINT AS correct_reports,
                COALESCE(us.incorrect_reports, 0)::BIGINT AS incorrect_reports,
                COALESCE(us.total_comments, 0)::BIGINT AS total_comments,
                COALESCE(us.total_votes_cast, 0)::BIGINT AS total_votes,
                COALESCE(us.days_active, 0)::BIGINT AS days_active
            FROM users u
            LEFT JOIN user_stats us ON u.id = us.user_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(TrustScoreService::breakdown(TrustScoreInputs {
            account_age_days: row.account_age_days,
            karma_points: row.karma_points,
            correct_reports: row.correct_reports,
            incorrect_reports: row.incorrect_reports,
            total_comments: row.total_comments,
            total_votes: row.total_votes,
            days_active: row.days_active,
            is_banned: row.is_banned,
        }))
    }

    async fn update_trust_score(&self, user_id: Uuid, update: &TrustScoreUpdate) -> Result<(), AppError> {
        let component_scores = update
            .component_scores
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query("SELECT update_user_trust_score($1, $2, $3, $4, $5, $6)")
            .bind(user_id)
            .bind(update.new_score)
            .bind(&update.reason)
            .bind(component_scores)
            .bind(update.changed_by)
            .bind(&update.notes)
            .execute(&self.pool)
            .await?;

        tracing::debug!(user_id = %user_id, new_score = update.new_score, reason = %update.reason, "Trust score updated");

        Ok(())
    }

    async fn trust_score_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<TrustScoreHistory>, AppError> {
        let window = PageRequest::new(limit, 0);

        let rows = sqlx::query_as::<_, TrustHistoryRow>(
            r#"
            SELECT id, user_id, old_score, new_score, change_reason,
                   component_scores, changed_by, notes, created_at
            FROM trust_score_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(window.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TrustHistoryRow::into_history).collect())
    }
}
