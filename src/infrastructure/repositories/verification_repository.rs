//! Verification Repository Implementation
//!
//! PostgreSQL implementation of the VerificationRepository trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    CreatorVerification, IdentityDocumentType, VerificationAuditLog, VerificationRepository,
    VerificationStatus, VerificationWithUser, ACTIVE_APPLICATION_CONSTRAINT,
};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::infrastructure::repositories::user_row::UserSummaryRow;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! verification_columns {
    ($p:literal) => {
        concat!(
            $p, "id, ", $p, "user_id, ", $p, "status, ", $p, "application_reason, ",
            $p, "identity_document_type, ", $p, "identity_verified, ",
            $p, "identity_verified_at, ", $p, "identity_verified_by, ",
            $p, "follower_count, ", $p, "content_creation_months, ",
            $p, "platform_username, ", $p, "platform_url, ",
            $p, "reviewed_by, ", $p, "reviewed_at, ", $p, "review_notes, ",
            $p, "rejection_reason, ", $p, "created_at, ", $p, "updated_at"
        )
    };
}

macro_rules! audit_columns {
    () => {
        "id, verification_id, action, performed_by, previous_status, new_status, notes, metadata, created_at"
    };
}

/// Database row representation for the `creator_verifications` table.
#[derive(Debug, sqlx::FromRow)]
struct VerificationRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    application_reason: Option<String>,
    identity_document_type: Option<String>,
    identity_verified: bool,
    identity_verified_at: Option<DateTime<Utc>>,
    identity_verified_by: Option<Uuid>,
    follower_count: Option<i32>,
    content_creation_months: Option<i32>,
    platform_username: Option<String>,
    platform_url: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    review_notes: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VerificationRow {
    fn into_verification(self) -> CreatorVerification {
        CreatorVerification {
            id: self.id,
            user_id: self.user_id,
            status: VerificationStatus::from_str(&self.status),
            application_reason: self.application_reason,
            identity_document_type: self
                .identity_document_type
                .as_deref()
                .and_then(IdentityDocumentType::parse),
            identity_verified: self.identity_verified,
            identity_verified_at: self.identity_verified_at,
            identity_verified_by: self.identity_verified_by,
            follower_count: self.follower_count,
            content_creation_months: self.content_creation_months,
            platform_username: self.platform_username,
            platform_url: self.platform_url,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            review_notes: self.review_notes,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VerificationWithUserRow {
    #[sqlx(flatten)]
    verification: VerificationRow,
    #[sqlx(flatten)]
    user: UserSummaryRow,
}

/// Database row representation for the `verification_audit_logs` table.
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: Uuid,
    verification_id: Uuid,
    action: String,
    performed_by: Option<Uuid>,
    previous_status: Option<String>,
    new_status: Option<String>,
    notes: Option<String>,
    metadata: Option<Json<HashMap<String, serde_json::Value>>>,
    created_at: DateTime<Utc>,
}

impl AuditLogRow {
    fn into_audit_log(self) -> VerificationAuditLog {
        VerificationAuditLog {
            id: self.id,
            verification_id: self.verification_id,
            action: self.action,
            performed_by: self.performed_by,
            previous_status: self.previous_status.as_deref().map(VerificationStatus::from_str),
            new_status: self.new_status.as_deref().map(VerificationStatus::from_str),
            notes: self.notes,
            metadata: self.metadata.map(|Json(m)| m),
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL verification repository implementation.
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    /// Create a new PgVerificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn create(&self, verification: &CreatorVerification) -> Result<CreatorVerification, AppError> {
        let row = sqlx::query_as::<_, VerificationRow>(concat!(
            "INSERT INTO creator_verifications (",
            verification_columns!(""),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING ",
            verification_columns!("")
        ))
        .bind(verification.id)
        .bind(verification.user_id)
        .bind(verification.status.as_str())
        .bind(&verification.application_reason)
        .bind(verification.identity_document_type.map(|t| t.as_str()))
        .bind(verification.identity_verified)
        .bind(verification.identity_verified_at)
        .bind(verification.identity_verified_by)
        .bind(verification.follower_count)
        .bind(verification.content_creation_months)
        .bind(&verification.platform_username)
        .bind(&verification.platform_url)
        .bind(verification.reviewed_by)
        .bind(verification.reviewed_at)
        .bind(&verification.review_notes)
        .bind(&verification.rejection_reason)
        .bind(verification.created_at)
        .bind(verification.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_constraint_violation(
                e,
                ACTIVE_APPLICATION_CONSTRAINT,
                "An active verification application already exists",
            )
        })?;

        tracing::debug!(verification_id = %row.id, user_id = %row.user_id, "Verification application created");

        Ok(row.into_verification())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<CreatorVerification, AppError> {
        let row = sqlx::query_as::<_, VerificationRow>(concat!(
            "SELECT ",
            verification_columns!(""),
            " FROM creator_verifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationRow::into_verification)
            .ok_or_else(|| AppError::NotFound(format!("Verification {} not found", id)))
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<CreatorVerification, AppError> {
        let row = sqlx::query_as::<_, VerificationRow>(concat!(
            "SELECT ",
            verification_columns!(""),
            " FROM creator_verifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationRow::into_verification).ok_or_else(|| {
            AppError::NotFound(format!("No verification found for user {}", user_id))
        })
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<VerificationWithUser>, AppError> {
        let query = PagedQuery {
            table: "creator_verifications",
            count_sql: "SELECT COUNT(*) FROM creator_verifications cv",
            select_sql: concat!(
                "SELECT ",
                verification_columns!("cv."),
                ", ",
                user_summary_columns!(),
                " FROM creator_verifications cv JOIN users u ON cv.user_id = u.id"
            ),
            order_by: "cv.created_at DESC",
        };

        let page = query
            .fetch::<VerificationWithUserRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq_opt("cv.status", status.map(|s| s.as_str()));
                },
            )
            .await?;

        Ok(page.map(|row| VerificationWithUser {
            verification: row.verification.into_verification(),
            user: row.user.into_summary(),
        }))
    }

    async fn update(&self, verification: &CreatorVerification) -> Result<CreatorVerification, AppError> {
        let row = sqlx::query_as::<_, VerificationRow>(concat!(
            "UPDATE creator_verifications
             SET status = $2, identity_verified = $3, identity_verified_at = $4,
                 identity_verified_by = $5, reviewed_by = $6, reviewed_at = $7,
                 review_notes = $8, rejection_reason = $9, updated_at = NOW()
             WHERE id = $1
             RETURNING ",
            verification_columns!("")
        ))
        .bind(verification.id)
        .bind(verification.status.as_str())
        .bind(verification.identity_verified)
        .bind(verification.identity_verified_at)
        .bind(verification.identity_verified_by)
        .bind(verification.reviewed_by)
        .bind(verification.reviewed_at)
        .bind(&verification.review_notes)
        .bind(&verification.rejection_reason)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationRow::into_verification).ok_or_else(|| {
            AppError::NotFound(format!("Verification {} not found", verification.id))
        })
    }

    async fn create_audit_log(&self, log: &VerificationAuditLog) -> Result<VerificationAuditLog, AppError> {
        let metadata = log
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query_as::<_, AuditLogRow>(concat!(
            "INSERT INTO verification_audit_logs (",
            audit_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING ",
            audit_columns!()
        ))
        .bind(log.id)
        .bind(log.verification_id)
        .bind(&log.action)
        .bind(log.performed_by)
        .bind(log.previous_status.map(|s| s.as_str()))
        .bind(log.new_status.map(|s| s.as_str()))
        .bind(&log.notes)
        .bind(metadata)
        .bind(log.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_audit_log())
    }

    async fn list_audit_logs(
        &self,
        verification_id: Uuid,
        limit: i64,
    ) -> Result<Vec<VerificationAuditLog>, AppError> {
        let window = PageRequest::new(limit, 0);

        let rows = sqlx::query_as::<_, AuditLogRow>(concat!(
            "SELECT ",
            audit_columns!(),
            " FROM verification_audit_logs WHERE verification_id = $1 ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(verification_id)
        .bind(window.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogRow::into_audit_log).collect())
    }
}
