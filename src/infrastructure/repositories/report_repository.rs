//! Report Repository Implementation
//!
//! PostgreSQL implementation of the ReportRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Report, ReportRepository, ReportStatus, ReportableType};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! report_columns {
    () => {
        "id, reporter_id, reportable_type, reportable_id, reason, description, \
         status, reviewed_by, reviewed_at, created_at"
    };
}

/// Database row representation for the `reports` table.
#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    reporter_id: Uuid,
    reportable_type: String,
    reportable_id: Uuid,
    reason: String,
    description: Option<String>,
    status: String,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> Report {
        Report {
            id: self.id,
            reporter_id: self.reporter_id,
            reportable_type: ReportableType::from_str(&self.reportable_type),
            reportable_id: self.reportable_id,
            reason: self.reason,
            description: self.description,
            status: ReportStatus::from_str(&self.status),
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL report repository implementation.
#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    /// Create a new PgReportRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, report: &Report) -> Result<Report, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(concat!(
            "INSERT INTO reports (",
            report_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING ",
            report_columns!()
        ))
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.reportable_type.as_str())
        .bind(report.reportable_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.reviewed_by)
        .bind(report.reviewed_at)
        .bind(report.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_report())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(concat!(
            "SELECT ",
            report_columns!(),
            " FROM reports WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReportRow::into_report))
    }

    async fn list(
        &self,
        status: Option<ReportStatus>,
        reportable_type: Option<ReportableType>,
        page: i64,
        limit: i64,
    ) -> Result<Page<Report>, AppError> {
        let query = PagedQuery {
            table: "reports",
            count_sql: "SELECT COUNT(*) FROM reports",
            select_sql: concat!("SELECT ", report_columns!(), " FROM reports"),
            order_by: "created_at DESC",
        };

        let page = query
            .fetch::<ReportRow, _>(
                &self.pool,
                PageRequest::from_page(page, limit),
                |p: &mut Predicates<'_, '_>| {
                    p.eq_opt("status", status.map(|s| s.as_str()))
                        .eq_opt("reportable_type", reportable_type.map(|t| t.as_str()));
                },
            )
            .await?;

        Ok(page.map(ReportRow::into_report))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        reviewer_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE reports SET status = $2, reviewed_by = $3, reviewed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        Ok(())
    }

    async fn has_open_duplicate(
        &self,
        reporter_id: Uuid,
        reportable_type: ReportableType,
        reportable_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reports
                WHERE reporter_id = $1
                  AND reportable_id = $2
                  AND reportable_type = $3
                  AND status IN ('pending', 'reviewed')
            )
            "#,
        )
        .bind(reporter_id)
        .bind(reportable_id)
        .bind(reportable_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_by_reporter(&self, reporter_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reports WHERE reporter_id = $1 AND created_at >= $2",
        )
        .bind(reporter_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_for_reportable(
        &self,
        reportable_type: ReportableType,
        reportable_id: Uuid,
    ) -> Result<Vec<Report>, AppError> {
        let rows = sqlx::query_as::<_, ReportRow>(concat!(
            "SELECT ",
            report_columns!(),
            " FROM reports WHERE reportable_id = $1 AND reportable_type = $2 ORDER BY created_at DESC"
        ))
        .bind(reportable_id)
        .bind(reportable_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReportRow::into_report).collect())
    }
}
