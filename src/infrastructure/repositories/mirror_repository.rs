//! Mirror Repository Implementation
//!
//! PostgreSQL implementation of the MirrorRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ClipMirror, MirrorMetric, MirrorRepository, MirrorStatus};
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

macro_rules! mirror_columns {
    () => {
        "id, clip_id, region, mirror_url, status, storage_provider, size_bytes, \
         created_at, last_accessed_at, access_count, expires_at, failure_reason"
    };
}

/// Database row representation for the `clip_mirrors` table.
#[derive(Debug, sqlx::FromRow)]
struct MirrorRow {
    id: Uuid,
    clip_id: Uuid,
    region: String,
    mirror_url: String,
    status: String,
    storage_provider: String,
    size_bytes: Option<i64>,
    created_at: DateTime<Utc>,
    last_accessed_at: Option<DateTime<Utc>>,
    access_count: i64,
    expires_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
}

impl MirrorRow {
    fn into_mirror(self) -> ClipMirror {
        ClipMirror {
            id: self.id,
            clip_id: self.clip_id,
            region: self.region,
            mirror_url: self.mirror_url,
            status: MirrorStatus::from_str(&self.status),
            storage_provider: self.storage_provider,
            size_bytes: self.size_bytes,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            access_count: self.access_count,
            expires_at: self.expires_at,
            failure_reason: self.failure_reason,
        }
    }
}

/// PostgreSQL mirror repository implementation.
#[derive(Clone)]
pub struct PgMirrorRepository {
    pool: PgPool,
}

impl PgMirrorRepository {
    /// Create a new PgMirrorRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MirrorRepository for PgMirrorRepository {
    async fn create(&self, mirror: &ClipMirror) -> Result<ClipMirror, AppError> {
        let row = sqlx::query_as::<_, MirrorRow>(concat!(
            "INSERT INTO clip_mirrors (",
            mirror_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING ",
            mirror_columns!()
        ))
        .bind(mirror.id)
        .bind(mirror.clip_id)
        .bind(&mirror.region)
        .bind(&mirror.mirror_url)
        .bind(mirror.status.as_str())
        .bind(&mirror.storage_provider)
        .bind(mirror.size_bytes)
        .bind(mirror.created_at)
        .bind(mirror.last_accessed_at)
        .bind(mirror.access_count)
        .bind(mirror.expires_at)
        .bind(&mirror.failure_reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "Clip already has a mirror in this region")
        })?;

        tracing::debug!(mirror_id = %row.id, clip_id = %row.clip_id, region = %row.region, "Mirror created");

        Ok(row.into_mirror())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ClipMirror>, AppError> {
        let row = sqlx::query_as::<_, MirrorRow>(concat!(
            "SELECT ",
            mirror_columns!(),
            " FROM clip_mirrors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MirrorRow::into_mirror))
    }

    async fn get_by_clip_and_region(&self, clip_id: Uuid, region: &str) -> Result<Option<ClipMirror>, AppError> {
        let row = sqlx::query_as::<_, MirrorRow>(concat!(
            "SELECT ",
            mirror_columns!(),
            " FROM clip_mirrors WHERE clip_id = $1 AND region = $2"
        ))
        .bind(clip_id)
        .bind(region)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MirrorRow::into_mirror))
    }

    async fn list_by_clip(&self, clip_id: Uuid) -> Result<Vec<ClipMirror>, AppError> {
        let rows = sqlx::query_as::<_, MirrorRow>(concat!(
            "SELECT ",
            mirror_columns!(),
            " FROM clip_mirrors WHERE clip_id = $1 ORDER BY created_at DESC"
        ))
        .bind(clip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MirrorRow::into_mirror).collect())
    }

    async fn list_active_by_region(&self, region: &str) -> Result<Vec<ClipMirror>, AppError> {
        let rows = sqlx::query_as::<_, MirrorRow>(concat!(
            "SELECT ",
            mirror_columns!(),
            " FROM clip_mirrors WHERE region = $1 AND status = $2 ORDER BY created_at DESC"
        ))
        .bind(region)
        .bind(MirrorStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MirrorRow::into_mirror).collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: MirrorStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE clip_mirrors SET status = $2, failure_reason = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(failure_reason)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Mirror {} not found", id)));
        }

        tracing::debug!(mirror_id = %id, status = status.as_str(), "Mirror status updated");

        Ok(())
    }

    async fn record_access(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE clip_mirrors SET access_count = access_count + 1, last_accessed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM clip_mirrors WHERE expires_at IS NOT NULL AND expires_at < NOW()",
        )
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, "Deleted expired mirrors");
        }

        Ok(deleted)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM clip_mirrors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Mirror {} not found", id)));
        }

        Ok(())
    }

    async fn record_metric(&self, metric: &MirrorMetric) -> Result<(), AppError> {
        let metadata = metric
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO mirror_metrics (id, clip_id, region, metric_type, metric_value, recorded_at, metadata)
            VALUES ($1, $2, $3, $4, $5, NOW(), $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(metric.clip_id)
        .bind(&metric.region)
        .bind(metric.metric_type.as_str())
        .bind(metric.metric_value)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn hit_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError> {
        let rate = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(
                SUM(CASE WHEN metric_type = 'access' THEN metric_value ELSE 0 END) * 100.0
                    / NULLIF(SUM(metric_value), 0),
                0
            )::DOUBLE PRECISION
            FROM mirror_metrics
            WHERE recorded_at >= $1 AND metric_type IN ('access', 'failover')
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(rate)
    }

    async fn popular_clips_for_mirroring(
        &self,
        threshold: i64,
        limit: i64,
        max_active_mirrors: i64,
    ) -> Result<Vec<Uuid>, AppError> {
        let window = PageRequest::new(limit, 0);

        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT c.id
            FROM clips c
            LEFT JOIN clip_mirrors cm ON c.id = cm.clip_id AND cm.status = 'active'
            WHERE (c.view_count >= $1 OR c.vote_score >= $1)
              AND c.is_removed = false
              AND c.dmca_removed = false
            GROUP BY c.id
            HAVING COUNT(cm.id) < $2
            ORDER BY c.view_count DESC, c.vote_score DESC
            LIMIT $3
            "#,
        )
        .bind(threshold)
        .bind(max_active_mirrors)
        .bind(window.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
