//! DMCA Repository Implementation
//!
//! PostgreSQL implementation of the DmcaRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    CounterNoticeStatus, DmcaCounterNotice, DmcaDashboardStats, DmcaNotice, DmcaRepository,
    DmcaStrike, NoticeStatus, StatusFilter, StrikeStatus,
};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

// `ip_address` is INET; `host()` reads it back without the prefix length.
macro_rules! notice_columns {
    () => {
        "id, complainant_name, complainant_email, complainant_address, complainant_phone, \
         relationship, copyrighted_work_description, infringing_urls, good_faith_statement, \
         accuracy_statement, signature, submitted_at, reviewed_at, reviewed_by, status, notes, \
         host(ip_address) AS ip_address, user_agent, created_at, updated_at"
    };
}

macro_rules! counter_notice_columns {
    () => {
        "id, dmca_notice_id, user_id, user_name, user_email, user_address, user_phone, \
         removed_material_url, removed_material_description, good_faith_statement, \
         consent_to_jurisdiction, consent_to_service, signature, submitted_at, forwarded_at, \
         waiting_period_ends, status, lawsuit_filed, lawsuit_filed_at, notes, \
         host(ip_address) AS ip_address, user_agent, created_at, updated_at"
    };
}

macro_rules! strike_columns {
    () => {
        "id, user_id, dmca_notice_id, clip_id, submission_id, strike_number, issued_at, \
         expires_at, status, removal_reason, removed_at, notes, created_at, updated_at"
    };
}

/// Database row representation for the `dmca_notices` table.
#[derive(Debug, sqlx::FromRow)]
struct NoticeRow {
    id: Uuid,
    complainant_name: String,
    complainant_email: String,
    complainant_address: String,
    complainant_phone: Option<String>,
    relationship: String,
    copyrighted_work_description: String,
    infringing_urls: Vec<String>,
    good_faith_statement: bool,
    accuracy_statement: bool,
    signature: String,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<Uuid>,
    status: String,
    notes: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NoticeRow {
    fn into_notice(self) -> DmcaNotice {
        DmcaNotice {
            id: self.id,
            complainant_name: self.complainant_name,
            complainant_email: self.complainant_email,
            complainant_address: self.complainant_address,
            complainant_phone: self.complainant_phone,
            relationship: self.relationship,
            copyrighted_work_description: self.copyrighted_work_description,
            infringing_urls: self.infringing_urls,
            good_faith_statement: self.good_faith_statement,
            accuracy_statement: self.accuracy_statement,
            signature: self.signature,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            reviewed_by: self.reviewed_by,
            status: NoticeStatus::from_str(&self.status),
            notes: self.notes,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Database row representation for the `dmca_counter_notices` table.
#[derive(Debug, sqlx::FromRow)]
struct CounterNoticeRow {
    id: Uuid,
    dmca_notice_id: Uuid,
    user_id: Option<Uuid>,
    user_name: String,
    user_email: String,
    user_address: String,
    user_phone: Option<String>,
    removed_material_url: String,
    removed_material_description: Option<String>,
    good_faith_statement: bool,
    consent_to_jurisdiction: bool,
    consent_to_service: bool,
    signature: String,
    submitted_at: DateTime<Utc>,
    forwarded_at: Option<DateTime<Utc>>,
    waiting_period_ends: Option<DateTime<Utc>>,
    status: String,
    lawsuit_filed: bool,
    lawsuit_filed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CounterNoticeRow {
    fn into_counter_notice(self) -> DmcaCounterNotice {
        DmcaCounterNotice {
            id: self.id,
            dmca_notice_id: self.dmca_notice_id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_email: self.user_email,
            user_address: self.user_address,
            user_phone: self.user_phone,
            removed_material_url: self.removed_material_url,
            removed_material_description: self.removed_material_description,
            good_faith_statement: self.good_faith_statement,
            consent_to_jurisdiction: self.consent_to_jurisdiction,
            consent_to_service: self.consent_to_service,
            signature: self.signature,
            submitted_at: self.submitted_at,
            forwarded_at: self.forwarded_at,
            waiting_period_ends: self.waiting_period_ends,
            status: CounterNoticeStatus::from_str(&self.status),
            lawsuit_filed: self.lawsuit_filed,
            lawsuit_filed_at: self.lawsuit_filed_at,
            notes: self.notes,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Database row representation for the `dmca_strikes` table.
#[derive(Debug, sqlx::FromRow)]
struct StrikeRow {
    id: Uuid,
    user_id: Uuid,
    dmca_notice_id: Uuid,
    clip_id: Option<Uuid>,
    submission_id: Option<Uuid>,
    strike_number: i32,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
    removal_reason: Option<String>,
    removed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StrikeRow {
    fn into_strike(self) -> DmcaStrike {
        DmcaStrike {
            id: self.id,
            user_id: self.user_id,
            dmca_notice_id: self.dmca_notice_id,
            clip_id: self.clip_id,
            submission_id: self.submission_id,
            strike_number: self.strike_number,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            status: StrikeStatus::from_str(&self.status),
            removal_reason: self.removal_reason,
            removed_at: self.removed_at,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DashboardRow {
    pending_notices: i64,
    pending_counter_notices: i64,
    content_awaiting_removal: i64,
    content_awaiting_restore: i64,
    users_with_active_strikes: i64,
    users_with_two_strikes: i64,
    total_takedowns_this_month: i64,
    total_counter_notices_this_month: i64,
}

/// PostgreSQL DMCA repository implementation.
#[derive(Clone)]
pub struct PgDmcaRepository {
    pool: PgPool,
}

impl PgDmcaRepository {
    /// Create a new PgDmcaRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DmcaRepository for PgDmcaRepository {
    // ========================================================================
    // Notices
    // ========================================================================

    async fn create_notice(&self, notice: &DmcaNotice) -> Result<DmcaNotice, AppError> {
        let row = sqlx::query_as::<_, NoticeRow>(concat!(
            r#"
            INSERT INTO dmca_notices (
                id, complainant_name, complainant_email, complainant_address, complainant_phone,
                relationship, copyrighted_work_description, infringing_urls, good_faith_statement,
                accuracy_statement, signature, submitted_at, status, ip_address, user_agent,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14::inet, $15, $16, $17)
            RETURNING "#,
            notice_columns!()
        ))
        .bind(notice.id)
        .bind(&notice.complainant_name)
        .bind(&notice.complainant_email)
        .bind(&notice.complainant_address)
        .bind(&notice.complainant_phone)
        .bind(&notice.relationship)
        .bind(&notice.copyrighted_work_description)
        .bind(&notice.infringing_urls)
        .bind(notice.good_faith_statement)
        .bind(notice.accuracy_statement)
        .bind(&notice.signature)
        .bind(notice.submitted_at)
        .bind(notice.status.as_str())
        .bind(&notice.ip_address)
        .bind(&notice.user_agent)
        .bind(notice.created_at)
        .bind(notice.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(notice_id = %row.id, urls = row.infringing_urls.len(), "DMCA notice created");

        Ok(row.into_notice())
    }

    async fn get_notice(&self, id: Uuid) -> Result<DmcaNotice, AppError> {
        let row = sqlx::query_as::<_, NoticeRow>(concat!(
            "SELECT ",
            notice_columns!(),
            " FROM dmca_notices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NoticeRow::into_notice)
            .ok_or_else(|| AppError::NotFound(format!("DMCA notice {} not found", id)))
    }

    async fn list_notices(
        &self,
        status: StatusFilter<NoticeStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<DmcaNotice>, AppError> {
        let query = PagedQuery {
            table: "dmca_notices",
            count_sql: "SELECT COUNT(*) FROM dmca_notices",
            select_sql: concat!("SELECT ", notice_columns!(), " FROM dmca_notices"),
            order_by: "submitted_at DESC",
        };
        let status = status.into_option();

        let page = query
            .fetch::<NoticeRow, _>(
                &self.pool,
                PageRequest::from_page(page, page_size),
                |p: &mut Predicates<'_, '_>| {
                    p.eq_opt("status", status.map(|s| s.as_str()));
                },
            )
            .await?;

        Ok(page.map(NoticeRow::into_notice))
    }

    async fn update_notice_status(
        &self,
        id: Uuid,
        status: NoticeStatus,
        reviewed_by: Uuid,
        notes: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE dmca_notices
            SET status = $2, reviewed_by = $3, reviewed_at = NOW(), notes = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewed_by)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("DMCA notice {} not found", id)));
        }

        tracing::debug!(notice_id = %id, status = status.as_str(), "DMCA notice status updated");

        Ok(())
    }

    async fn pending_notice_count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM dmca_notices WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // ========================================================================
    // Counter-notices
    // ========================================================================

    async fn create_counter_notice(
        &self,
        counter_notice: &DmcaCounterNotice,
    ) -> Result<DmcaCounterNotice, AppError> {
        let row = sqlx::query_as::<_, CounterNoticeRow>(concat!(
            r#"
            INSERT INTO dmca_counter_notices (
                id, dmca_notice_id, user_id, user_name, user_email, user_address, user_phone,
                removed_material_url, removed_material_description, good_faith_statement,
                consent_to_jurisdiction, consent_to_service, signature, submitted_at, forwarded_at,
                waiting_period_ends, status, lawsuit_filed, lawsuit_filed_at, notes, ip_address,
                user_agent, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                    $19, $20, $21::inet, $22, $23, $24)
            RETURNING "#,
            counter_notice_columns!()
        ))
        .bind(counter_notice.id)
        .bind(counter_notice.dmca_notice_id)
        .bind(counter_notice.user_id)
        .bind(&counter_notice.user_name)
        .bind(&counter_notice.user_email)
        .bind(&counter_notice.user_address)
        .bind(&counter_notice.user_phone)
        .bind(&counter_notice.removed_material_url)
        .bind(&counter_notice.removed_material_description)
        .bind(counter_notice.good_faith_statement)
        .bind(counter_notice.consent_to_jurisdiction)
        .bind(counter_notice.consent_to_service)
        .bind(&counter_notice.signature)
        .bind(counter_notice.submitted_at)
        .bind(counter_notice.forwarded_at)
        .bind(counter_notice.waiting_period_ends)
        .bind(counter_notice.status.as_str())
        .bind(counter_notice.lawsuit_filed)
        .bind(counter_notice.lawsuit_filed_at)
        .bind(&counter_notice.notes)
        .bind(&counter_notice.ip_address)
        .bind(&counter_notice.user_agent)
        .bind(counter_notice.created_at)
        .bind(counter_notice.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            counter_notice_id = %row.id,
            notice_id = %row.dmca_notice_id,
            "DMCA counter-notice created"
        );

        Ok(row.into_counter_notice())
    }

    async fn get_counter_notice(&self, id: Uuid) -> Result<DmcaCounterNotice, AppError> {
        let row = sqlx::query_as::<_, CounterNoticeRow>(concat!(
            "SELECT ",
            counter_notice_columns!(),
            " FROM dmca_counter_notices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CounterNoticeRow::into_counter_notice)
            .ok_or_else(|| AppError::NotFound(format!("DMCA counter-notice {} not found", id)))
    }

    async fn list_counter_notices(
        &self,
        status: StatusFilter<CounterNoticeStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<DmcaCounterNotice>, AppError> {
        let query = PagedQuery {
            table: "dmca_counter_notices",
            count_sql: "SELECT COUNT(*) FROM dmca_counter_notices",
            select_sql: concat!("SELECT ", counter_notice_columns!(), " FROM dmca_counter_notices"),
            order_by: "submitted_at DESC",
        };
        let status = status.into_option();

        let page = query
            .fetch::<CounterNoticeRow, _>(
                &self.pool,
                PageRequest::from_page(page, page_size),
                |p: &mut Predicates<'_, '_>| {
                    p.eq_opt("status", status.map(|s| s.as_str()));
                },
            )
            .await?;

        Ok(page.map(CounterNoticeRow::into_counter_notice))
    }

    async fn list_counter_notices_for_notice(
        &self,
        notice_id: Uuid,
    ) -> Result<Vec<DmcaCounterNotice>, AppError> {
        let rows = sqlx::query_as::<_, CounterNoticeRow>(concat!(
            "SELECT ",
            counter_notice_columns!(),
            " FROM dmca_counter_notices WHERE dmca_notice_id = $1 ORDER BY submitted_at ASC"
        ))
        .bind(notice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CounterNoticeRow::into_counter_notice).collect())
    }

    async fn update_counter_notice_status(
        &self,
        id: Uuid,
        status: CounterNoticeStatus,
        notes: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE dmca_counter_notices
            SET status = $2, notes = COALESCE($3, notes), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("DMCA counter-notice {} not found", id)));
        }

        tracing::debug!(counter_notice_id = %id, status = status.as_str(), "DMCA counter-notice status updated");

        Ok(())
    }

    async fn mark_counter_notice_forwarded(
        &self,
        id: Uuid,
        waiting_period_ends: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE dmca_counter_notices
            SET status = 'forwarded', forwarded_at = NOW(), waiting_period_ends = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(waiting_period_ends)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("DMCA counter-notice {} not found", id)));
        }

        Ok(())
    }

    async fn counter_notices_awaiting_restore(&self) -> Result<Vec<DmcaCounterNotice>, AppError> {
        let rows = sqlx::query_as::<_, CounterNoticeRow>(concat!(
            "SELECT ",
            counter_notice_columns!(),
            r#"
            FROM dmca_counter_notices
            WHERE status = 'waiting'
              AND waiting_period_ends IS NOT NULL
              AND waiting_period_ends <= NOW()
              AND lawsuit_filed = false
            ORDER BY waiting_period_ends ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CounterNoticeRow::into_counter_notice).collect())
    }

    // ========================================================================
    // Strikes
    // ========================================================================

    async fn create_strike(&self, strike: &DmcaStrike) -> Result<DmcaStrike, AppError> {
        let row = sqlx::query_as::<_, StrikeRow>(concat!(
            "INSERT INTO dmca_strikes (",
            strike_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING ",
            strike_columns!()
        ))
        .bind(strike.id)
        .bind(strike.user_id)
        .bind(strike.dmca_notice_id)
        .bind(strike.clip_id)
        .bind(strike.submission_id)
        .bind(strike.strike_number)
        .bind(strike.issued_at)
        .bind(strike.expires_at)
        .bind(strike.status.as_str())
        .bind(&strike.removal_reason)
        .bind(strike.removed_at)
        .bind(&strike.notes)
        .bind(strike.created_at)
        .bind(strike.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            strike_id = %row.id,
            user_id = %row.user_id,
            strike_number = row.strike_number,
            "DMCA strike issued"
        );

        Ok(row.into_strike())
    }

    async fn active_strikes(&self, user_id: Uuid) -> Result<Vec<DmcaStrike>, AppError> {
        let rows = sqlx::query_as::<_, StrikeRow>(concat!(
            "SELECT ",
            strike_columns!(),
            " FROM dmca_strikes WHERE user_id = $1 AND status = 'active' ORDER BY issued_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StrikeRow::into_strike).collect())
    }

    async fn all_strikes(&self, user_id: Uuid) -> Result<Vec<DmcaStrike>, AppError> {
        let rows = sqlx::query_as::<_, StrikeRow>(concat!(
            "SELECT ",
            strike_columns!(),
            " FROM dmca_strikes WHERE user_id = $1 ORDER BY issued_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StrikeRow::into_strike).collect())
    }

    async fn remove_strike(&self, strike_id: Uuid, reason: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE dmca_strikes
            SET status = 'removed', removal_reason = $2, removed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(strike_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("DMCA strike {} not found", strike_id)));
        }

        tracing::debug!(strike_id = %strike_id, "DMCA strike removed");

        Ok(())
    }

    async fn expire_old_strikes(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE dmca_strikes
            SET status = 'expired', removal_reason = 'expired', updated_at = NOW()
            WHERE status = 'active' AND expires_at <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            tracing::info!(expired, "Expired DMCA strikes");
        }

        Ok(expired)
    }

    async fn users_with_strikes(&self, min_strikes: i64) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM dmca_strikes
            WHERE status = 'active'
            GROUP BY user_id
            HAVING COUNT(*) >= $1
            ORDER BY COUNT(*) DESC, user_id
            "#,
        )
        .bind(min_strikes)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn dashboard_stats(&self) -> Result<DmcaDashboardStats, AppError> {
        let row = sqlx::query_as::<_, DashboardRow>(
            r#"
            WITH active AS (
                SELECT user_id, COUNT(*) AS strikes
                FROM dmca_strikes
                WHERE status = 'active'
                GROUP BY user_id
            )
            SELECT
                (SELECT COUNT(*) FROM dmca_notices WHERE status = 'pending') AS pending_notices,
                (SELECT COUNT(*) FROM dmca_counter_notices WHERE status = 'pending') AS pending_counter_notices,
                (SELECT COUNT(*) FROM dmca_notices WHERE status = 'valid') AS content_awaiting_removal,
                (SELECT COUNT(*) FROM dmca_counter_notices
                    WHERE status = 'waiting'
                      AND waiting_period_ends IS NOT NULL
                      AND waiting_period_ends <= NOW()
                      AND lawsuit_filed = false) AS content_awaiting_restore,
                (SELECT COUNT(*) FROM active) AS users_with_active_strikes,
                (SELECT COUNT(*) FROM active WHERE strikes = 2) AS users_with_two_strikes,
                (SELECT COUNT(*) FROM dmca_notices
                    WHERE submitted_at >= DATE_TRUNC('month', CURRENT_DATE)) AS total_takedowns_this_month,
                (SELECT COUNT(*) FROM dmca_counter_notices
                    WHERE submitted_at >= DATE_TRUNC('month', CURRENT_DATE)) AS total_counter_notices_this_month
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DmcaDashboardStats {
            pending_notices: row.pending_notices,
            pending_counter_notices: row.pending_counter_notices,
            content_awaiting_removal: row.content_awaiting_removal,
            content_awaiting_restore: row.content_awaiting_restore,
            users_with_active_strikes: row.users_with_active_strikes,
            users_with_two_strikes: row.users_with_two_strikes,
            total_takedowns_this_month: row.total_takedowns_this_month,
            total_counter_notices_this_month: row.total_counter_notices_this_month,
        })
    }
}
