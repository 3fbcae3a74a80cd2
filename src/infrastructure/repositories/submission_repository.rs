//! Submission Repository Implementation
//!
//! PostgreSQL implementation of the SubmissionRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    ClipSubmission, SubmissionRepository, SubmissionStats, SubmissionStatus, SubmissionWithUser,
};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::infrastructure::repositories::user_row::UserSummaryRow;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! submission_columns {
    ($p:literal) => {
        concat!(
            $p, "id, ", $p, "user_id, ", $p, "twitch_clip_id, ", $p, "twitch_clip_url, ",
            $p, "title, ", $p, "custom_title, ", $p, "broadcaster_name_override, ", $p, "tags, ",
            $p, "is_nsfw, ", $p, "submission_reason, ", $p, "status, ", $p, "rejection_reason, ",
            $p, "reviewed_by, ", $p, "reviewed_at, ", $p, "created_at, ", $p, "updated_at, ",
            $p, "creator_name, ", $p, "creator_id, ", $p, "broadcaster_name, ",
            $p, "broadcaster_id, ", $p, "game_id, ", $p, "game_name, ", $p, "thumbnail_url, ",
            $p, "duration, ", $p, "view_count"
        )
    };
}

/// Database row representation for the `clip_submissions` table.
#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    user_id: Uuid,
    twitch_clip_id: String,
    twitch_clip_url: String,
    title: Option<String>,
    custom_title: Option<String>,
    broadcaster_name_override: Option<String>,
    tags: Option<Vec<String>>,
    is_nsfw: bool,
    submission_reason: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_name: Option<String>,
    creator_id: Option<String>,
    broadcaster_name: Option<String>,
    broadcaster_id: Option<String>,
    game_id: Option<String>,
    game_name: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    view_count: i32,
}

impl SubmissionRow {
    fn into_submission(self) -> ClipSubmission {
        ClipSubmission {
            id: self.id,
            user_id: self.user_id,
            twitch_clip_id: self.twitch_clip_id,
            twitch_clip_url: self.twitch_clip_url,
            title: self.title,
            custom_title: self.custom_title,
            broadcaster_name_override: self.broadcaster_name_override,
            tags: self.tags.unwrap_or_default(),
            is_nsfw: self.is_nsfw,
            submission_reason: self.submission_reason,
            status: SubmissionStatus::from_str(&self.status),
            rejection_reason: self.rejection_reason,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            creator_name: self.creator_name,
            creator_id: self.creator_id,
            broadcaster_name: self.broadcaster_name,
            broadcaster_id: self.broadcaster_id,
            game_id: self.game_id,
            game_name: self.game_name,
            thumbnail_url: self.thumbnail_url,
            duration: self.duration,
            view_count: self.view_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubmissionWithUserRow {
    #[sqlx(flatten)]
    submission: SubmissionRow,
    #[sqlx(flatten)]
    user: UserSummaryRow,
}

#[derive(Debug, sqlx::FromRow)]
struct SubmissionStatsRow {
    user_id: Uuid,
    total_submissions: i64,
    approved_count: i64,
    rejected_count: i64,
    pending_count: i64,
    approval_rate: f64,
}

/// PostgreSQL submission repository implementation.
#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    /// Create a new PgSubmissionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn create(&self, submission: &ClipSubmission) -> Result<ClipSubmission, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "INSERT INTO clip_submissions (",
            submission_columns!(""),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23, $24, $25) RETURNING ",
            submission_columns!("")
        ))
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(&submission.twitch_clip_id)
        .bind(&submission.twitch_clip_url)
        .bind(&submission.title)
        .bind(&submission.custom_title)
        .bind(&submission.broadcaster_name_override)
        .bind(&submission.tags)
        .bind(submission.is_nsfw)
        .bind(&submission.submission_reason)
        .bind(submission.status.as_str())
        .bind(&submission.rejection_reason)
        .bind(submission.reviewed_by)
        .bind(submission.reviewed_at)
        .bind(submission.created_at)
        .bind(submission.updated_at)
        .bind(&submission.creator_name)
        .bind(&submission.creator_id)
        .bind(&submission.broadcaster_name)
        .bind(&submission.broadcaster_id)
        .bind(&submission.game_id)
        .bind(&submission.game_name)
        .bind(&submission.thumbnail_url)
        .bind(submission.duration)
        .bind(submission.view_count)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            submission_id = %row.id,
            twitch_clip_id = %row.twitch_clip_id,
            "Clip submission created"
        );

        Ok(row.into_submission())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<ClipSubmission, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(""),
            " FROM clip_submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SubmissionRow::into_submission)
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    async fn find_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<ClipSubmission>, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(concat!(
            "SELECT ",
            submission_columns!(""),
            " FROM clip_submissions WHERE twitch_clip_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(twitch_clip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SubmissionRow::into_submission))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Page<ClipSubmission>, AppError> {
        let query = PagedQuery {
            table: "clip_submissions",
            count_sql: "SELECT COUNT(*) FROM clip_submissions",
            select_sql: concat!("SELECT ", submission_columns!(""), " FROM clip_submissions"),
            order_by: "created_at DESC",
        };

        let page = query
            .fetch::<SubmissionRow, _>(
                &self.pool,
                PageRequest::from_page(page, limit),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("user_id", user_id);
                },
            )
            .await?;

        Ok(page.map(SubmissionRow::into_submission))
    }

    async fn list_pending(&self, page: i64, limit: i64) -> Result<Page<SubmissionWithUser>, AppError> {
        let query = PagedQuery {
            table: "clip_submissions",
            count_sql: "SELECT COUNT(*) FROM clip_submissions s",
            select_sql: concat!(
                "SELECT ",
                submission_columns!("s."),
                ", ",
                user_summary_columns!(),
                " FROM clip_submissions s JOIN users u ON s.user_id = u.id"
            ),
            order_by: "s.created_at ASC",
        };

        let page = query
            .fetch::<SubmissionWithUserRow, _>(
                &self.pool,
                PageRequest::from_page(page, limit),
                |p: &mut Predicates<'_, '_>| {
                    p.push("s.status = 'pending'");
                },
            )
            .await?;

        Ok(page.map(|row| SubmissionWithUser {
            submission: row.submission.into_submission(),
            user: row.user.into_summary(),
        }))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        reviewed_by: Uuid,
        rejection_reason: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE clip_submissions
            SET status = $2, reviewed_by = $3, reviewed_at = NOW(),
                rejection_reason = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(rejection_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Submission {} not found", id)));
        }

        tracing::debug!(submission_id = %id, status = %status, "Submission reviewed");

        Ok(())
    }

    async fn count_user_submissions(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM clip_submissions WHERE user_id = $1 AND created_at > $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<SubmissionStats, AppError> {
        let row = sqlx::query_as::<_, SubmissionStatsRow>(
            r#"
            SELECT user_id,
                   total_submissions::BIGINT AS total_submissions,
                   approved_count::BIGINT AS approved_count,
                   rejected_count::BIGINT AS rejected_count,
                   pending_count::BIGINT AS pending_count,
                   COALESCE(approval_rate, 0)::FLOAT8 AS approval_rate
            FROM submission_stats
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| SubmissionStats {
                user_id: r.user_id,
                total_submissions: r.total_submissions,
                approved_count: r.approved_count,
                rejected_count: r.rejected_count,
                pending_count: r.pending_count,
                approval_rate: r.approval_rate,
            })
            .unwrap_or_else(|| SubmissionStats::empty(user_id)))
    }
}
