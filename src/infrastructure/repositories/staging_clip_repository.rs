//! Staging Clip Repository Implementation
//!
//! PostgreSQL implementation of the StagingClipRepository trait.
//! Handles discovered clips in `discovery_clips` and their promotion into `clips`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    ClaimRequest, PublishedClip, StagingClip, StagingClipFilter, StagingClipRepository,
    StagingClipSort,
};
use crate::infrastructure::database::{Comparison, PagedQuery, Predicates};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::clip_row::PublishedClipRow;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! staging_columns {
    () => {
        "d.id, d.twitch_clip_id, d.twitch_clip_url, d.embed_url, d.title, \
         d.creator_name, d.creator_id, d.broadcaster_name, d.broadcaster_id, \
         d.game_id, d.game_name, d.language, d.thumbnail_url, d.duration, \
         d.view_count, d.created_at, d.imported_at, d.is_nsfw, d.is_removed, d.is_hidden"
    };
}

/// Database row representation for the `discovery_clips` table.
#[derive(Debug, sqlx::FromRow)]
struct StagingClipRow {
    id: Uuid,
    twitch_clip_id: String,
    twitch_clip_url: String,
    embed_url: String,
    title: String,
    creator_name: String,
    creator_id: Option<String>,
    broadcaster_name: String,
    broadcaster_id: Option<String>,
    game_id: Option<String>,
    game_name: Option<String>,
    language: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    view_count: i32,
    created_at: DateTime<Utc>,
    imported_at: DateTime<Utc>,
    is_nsfw: bool,
    is_removed: bool,
    is_hidden: bool,
}

impl StagingClipRow {
    fn into_staging_clip(self) -> StagingClip {
        StagingClip {
            id: self.id,
            twitch_clip_id: self.twitch_clip_id,
            twitch_clip_url: self.twitch_clip_url,
            embed_url: self.embed_url,
            title: self.title,
            creator_name: self.creator_name,
            creator_id: self.creator_id,
            broadcaster_name: self.broadcaster_name,
            broadcaster_id: self.broadcaster_id,
            game_id: self.game_id,
            game_name: self.game_name,
            language: self.language,
            thumbnail_url: self.thumbnail_url,
            duration: self.duration,
            view_count: self.view_count,
            created_at: self.created_at,
            imported_at: self.imported_at,
            is_nsfw: self.is_nsfw,
            is_removed: self.is_removed,
            is_hidden: self.is_hidden,
        }
    }
}

/// ORDER BY expression for a staging listing sort.
fn order_clause(sort: StagingClipSort) -> &'static str {
    match sort {
        StagingClipSort::Views | StagingClipSort::Trending => "d.view_count DESC, d.created_at DESC",
        StagingClipSort::New => "d.created_at DESC",
    }
}

/// Push the listing predicates shared by the count and page queries.
fn apply_filter(p: &mut Predicates<'_, '_>, filter: &StagingClipFilter) {
    p.push("d.is_removed = false");
    if !filter.show_hidden {
        p.push("d.is_hidden = false");
    }

    p.eq_opt("d.game_id", filter.game_id.clone())
        .eq_opt("d.broadcaster_id", filter.broadcaster_id.clone())
        .eq_opt("d.creator_id", filter.creator_id.clone());

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        p.contains_ci("d.title", search);
    }

    if let Some(language) = filter.language.clone().filter(|l| !l.is_empty()) {
        p.with(|b| {
            b.push("d.language = ")
                .push_bind(language.clone())
                .push(" OR d.language = split_part(")
                .push_bind(language)
                .push(", '-', 1) OR d.language IS NULL OR d.language = ''");
        });
    }

    if filter.top_10k_streamers {
        p.push("EXISTS (SELECT 1 FROM top_streamers ts WHERE ts.broadcaster_id = d.broadcaster_id)");
    }

    p.cmp_opt("d.created_at", Comparison::Gte, filter.date_from)
        .cmp_opt("d.created_at", Comparison::Lte, filter.date_to);
}

/// PostgreSQL staging clip repository implementation.
#[derive(Clone)]
pub struct PgStagingClipRepository {
    pool: PgPool,
}

impl PgStagingClipRepository {
    /// Create a new PgStagingClipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hide or unhide a staged clip from default listings.
    pub async fn set_hidden(&self, id: Uuid, hidden: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE discovery_clips SET is_hidden = $2 WHERE id = $1")
            .bind(id)
            .bind(hidden)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Discovery clip {} not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl StagingClipRepository for PgStagingClipRepository {
    async fn create(&self, clip: &StagingClip) -> Result<StagingClip, AppError> {
        let row = sqlx::query_as::<_, StagingClipRow>(concat!(
            "WITH inserted AS (
                INSERT INTO discovery_clips (
                    id, twitch_clip_id, twitch_clip_url, embed_url, title,
                    creator_name, creator_id, broadcaster_name, broadcaster_id,
                    game_id, game_name, language, thumbnail_url, duration,
                    view_count, created_at, imported_at, is_nsfw, is_removed, is_hidden
                )
                SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                       $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
                WHERE NOT EXISTS (SELECT 1 FROM clips WHERE twitch_clip_id = $2)
                RETURNING *
            )
            SELECT ",
            staging_columns!(),
            " FROM inserted d"
        ))
        .bind(clip.id)
        .bind(&clip.twitch_clip_id)
        .bind(&clip.twitch_clip_url)
        .bind(&clip.embed_url)
        .bind(&clip.title)
        .bind(&clip.creator_name)
        .bind(&clip.creator_id)
        .bind(&clip.broadcaster_name)
        .bind(&clip.broadcaster_id)
        .bind(&clip.game_id)
        .bind(&clip.game_name)
        .bind(&clip.language)
        .bind(&clip.thumbnail_url)
        .bind(clip.duration)
        .bind(clip.view_count)
        .bind(clip.created_at)
        .bind(clip.imported_at)
        .bind(clip.is_nsfw)
        .bind(clip.is_removed)
        .bind(clip.is_hidden)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                format!("Clip {} is already staged", clip.twitch_clip_id),
            )
        })?;

        match row {
            Some(row) => {
                tracing::debug!(twitch_clip_id = %clip.twitch_clip_id, "Staged discovery clip");
                Ok(row.into_staging_clip())
            }
            None => Err(AppError::Conflict(format!(
                "Clip {} is already published",
                clip.twitch_clip_id
            ))),
        }
    }

    async fn exists_by_twitch_clip_id(&self, twitch_clip_id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM discovery_clips WHERE twitch_clip_id = $1)",
        )
        .bind(twitch_clip_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<StagingClip>, AppError> {
        let row = sqlx::query_as::<_, StagingClipRow>(concat!(
            "SELECT ",
            staging_columns!(),
            " FROM discovery_clips d WHERE d.twitch_clip_id = $1 AND d.is_removed = false"
        ))
        .bind(twitch_clip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StagingClipRow::into_staging_clip))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StagingClip>, AppError> {
        let row = sqlx::query_as::<_, StagingClipRow>(concat!(
            "SELECT ",
            staging_columns!(),
            " FROM discovery_clips d WHERE d.id = $1 AND d.is_removed = false"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StagingClipRow::into_staging_clip))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM discovery_clips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Discovery clip {} not found", id)));
        }

        Ok(())
    }

    async fn delete_by_twitch_clip_id(&self, twitch_clip_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM discovery_clips WHERE twitch_clip_id = $1")
            .bind(twitch_clip_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Discovery clip {} not found",
                twitch_clip_id
            )));
        }

        Ok(())
    }

    #[tracing::instrument(
        skip(self, request),
        fields(twitch_clip_id = %request.twitch_clip_id, user_id = %request.user_id)
    )]
    async fn claim(&self, request: &ClaimRequest) -> Result<PublishedClip, AppError> {
        let mut tx = self.pool.begin().await?;

        // Rows locked by a concurrent claim are skipped, not waited on
        let locked = sqlx::query_as::<_, StagingClipRow>(concat!(
            "SELECT ",
            staging_columns!(),
            " FROM discovery_clips d
              WHERE d.twitch_clip_id = $1 AND d.is_removed = false
              FOR UPDATE SKIP LOCKED"
        ))
        .bind(&request.twitch_clip_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(staged) = locked else {
            metrics::record_claim(false);
            tracing::info!("Discovery clip not found or already claimed");
            return Err(AppError::Conflict(format!(
                "Discovery clip {} not found or already claimed",
                request.twitch_clip_id
            )));
        };

        let staged_id = staged.id;
        let clip = staged.into_staging_clip().into_published(request, Utc::now());

        let inserted = sqlx::query_as::<_, PublishedClipRow>(concat!(
            "INSERT INTO clips (",
            published_clip_columns!(""),
            ") VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33
            )
            ON CONFLICT (twitch_clip_id) DO NOTHING
            RETURNING ",
            published_clip_columns!("")
        ))
        .bind(clip.id)
        .bind(&clip.twitch_clip_id)
        .bind(&clip.twitch_clip_url)
        .bind(&clip.embed_url)
        .bind(&clip.title)
        .bind(&clip.creator_name)
        .bind(&clip.creator_id)
        .bind(&clip.broadcaster_name)
        .bind(&clip.broadcaster_id)
        .bind(&clip.game_id)
        .bind(&clip.game_name)
        .bind(&clip.language)
        .bind(&clip.thumbnail_url)
        .bind(clip.duration)
        .bind(clip.view_count)
        .bind(clip.created_at)
        .bind(clip.imported_at)
        .bind(clip.vote_score)
        .bind(clip.comment_count)
        .bind(clip.favorite_count)
        .bind(clip.is_featured)
        .bind(clip.is_nsfw)
        .bind(clip.is_removed)
        .bind(&clip.removed_reason)
        .bind(clip.is_hidden)
        .bind(clip.submitted_by_user_id)
        .bind(clip.submitted_at)
        .bind(clip.trending_score)
        .bind(clip.hot_score)
        .bind(clip.dmca_removed)
        .bind(clip.dmca_notice_id)
        .bind(clip.dmca_removed_at)
        .bind(clip.dmca_reinstated_at)
        .fetch_optional(&mut *tx)
        .await?;

        // A published row with this external id already exists; the staged
        // row is left in place when the transaction rolls back on drop.
        let Some(inserted) = inserted else {
            metrics::record_claim(false);
            tracing::warn!("Staged clip already has a published counterpart");
            return Err(AppError::Conflict(format!(
                "Clip {} is already published",
                request.twitch_clip_id
            )));
        };

        sqlx::query("DELETE FROM discovery_clips WHERE id = $1")
            .bind(staged_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        metrics::record_claim(true);
        tracing::info!(clip_id = %inserted.id, "Discovery clip claimed");

        Ok(inserted.into_published_clip())
    }

    async fn list(
        &self,
        filter: &StagingClipFilter,
        sort: StagingClipSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<StagingClip>, AppError> {
        let query = PagedQuery {
            table: "discovery_clips",
            count_sql: "SELECT COUNT(*) FROM discovery_clips d",
            select_sql: concat!("SELECT ", staging_columns!(), " FROM discovery_clips d"),
            order_by: order_clause(sort),
        };

        let page = query
            .fetch::<StagingClipRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| apply_filter(p, filter),
            )
            .await?;

        Ok(page.map(StagingClipRow::into_staging_clip))
    }

    async fn find_published_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<PublishedClip>, AppError> {
        let row = sqlx::query_as::<_, PublishedClipRow>(concat!(
            "SELECT ",
            published_clip_columns!(""),
            " FROM clips WHERE twitch_clip_id = $1"
        ))
        .bind(twitch_clip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PublishedClipRow::into_published_clip))
    }
}
