//! DMCA compliance entities and repository trait.
//!
//! Maps to the `dmca_notices`, `dmca_counter_notices` and `dmca_strikes`
//! tables. Status fields advance through fixed vocabularies; time-gated
//! transitions are evaluated against stored timestamps when queried.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// How long a strike stays active.
pub const STRIKE_LIFETIME_DAYS: i64 = 365;

/// Active strikes at which an account is terminated.
pub const STRIKES_FOR_TERMINATION: i64 = 3;

/// Takedown notice workflow: pending, then valid or invalid, then processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    #[default]
    Pending,
    Valid,
    Invalid,
    Processed,
}

impl NoticeStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "valid" => Self::Valid,
            "invalid" => Self::Invalid,
            "processed" => Self::Processed,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Processed => "processed",
        }
    }
}

/// Counter-notice workflow: pending, forwarded to the complainant, waiting
/// out the statutory period, then reinstated or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CounterNoticeStatus {
    #[default]
    Pending,
    Forwarded,
    Waiting,
    Reinstated,
    Rejected,
}

impl CounterNoticeStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "forwarded" => Self::Forwarded,
            "waiting" => Self::Waiting,
            "reinstated" => Self::Reinstated,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Forwarded => "forwarded",
            Self::Waiting => "waiting",
            Self::Reinstated => "reinstated",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrikeStatus {
    #[default]
    Active,
    Removed,
    Expired,
}

impl StrikeStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "removed" => Self::Removed,
            "expired" => Self::Expired,
            _ => Self::Active,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Removed => "removed",
            Self::Expired => "expired",
        }
    }
}

/// Filter for notice listings. `All` matches every status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S> StatusFilter<S> {
    pub fn into_option(self) -> Option<S> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status),
        }
    }
}

impl StatusFilter<NoticeStatus> {
    /// `""` and `"all"` match everything.
    pub fn parse_notice(s: &str) -> Self {
        match s {
            "" | "all" => Self::All,
            other => Self::Only(NoticeStatus::from_str(other)),
        }
    }
}

impl StatusFilter<CounterNoticeStatus> {
    /// `""` and `"all"` match everything.
    pub fn parse_counter_notice(s: &str) -> Self {
        match s {
            "" | "all" => Self::All,
            other => Self::Only(CounterNoticeStatus::from_str(other)),
        }
    }
}

/// A takedown notice from a copyright holder or their agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmcaNotice {
    pub id: Uuid,
    pub complainant_name: String,
    pub complainant_email: String,
    pub complainant_address: String,
    pub complainant_phone: Option<String>,

    /// `owner` or `agent`
    pub relationship: String,

    pub copyrighted_work_description: String,
    pub infringing_urls: Vec<String>,
    pub good_faith_statement: bool,
    pub accuracy_statement: bool,
    pub signature: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub status: NoticeStatus,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's response to a takedown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmcaCounterNotice {
    pub id: Uuid,
    pub dmca_notice_id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub user_email: String,
    pub user_address: String,
    pub user_phone: Option<String>,
    pub removed_material_url: String,
    pub removed_material_description: Option<String>,
    pub good_faith_statement: bool,
    pub consent_to_jurisdiction: bool,
    pub consent_to_service: bool,
    pub signature: String,
    pub submitted_at: DateTime<Utc>,
    pub forwarded_at: Option<DateTime<Utc>>,
    pub waiting_period_ends: Option<DateTime<Utc>>,
    pub status: CounterNoticeStatus,
    pub lawsuit_filed: bool,
    pub lawsuit_filed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DmcaCounterNotice {
    /// Whether content can be restored at `now`.
    pub fn ready_for_restore(&self, now: DateTime<Utc>) -> bool {
        self.status == CounterNoticeStatus::Waiting
            && !self.lawsuit_filed
            && self.waiting_period_ends.is_some_and(|ends| ends <= now)
    }
}

/// A copyright strike against a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmcaStrike {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dmca_notice_id: Uuid,
    pub clip_id: Option<Uuid>,
    pub submission_id: Option<Uuid>,
    pub strike_number: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: StrikeStatus,
    pub removal_reason: Option<String>,
    pub removed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DmcaStrike {
    /// New active strike expiring after `STRIKE_LIFETIME_DAYS`.
    pub fn new(user_id: Uuid, dmca_notice_id: Uuid, strike_number: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            dmca_notice_id,
            clip_id: None,
            submission_id: None,
            strike_number,
            issued_at: now,
            expires_at: now + Duration::days(STRIKE_LIFETIME_DAYS),
            status: StrikeStatus::Active,
            removal_reason: None,
            removed_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Counters for the admin compliance dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmcaDashboardStats {
    pub pending_notices: i64,
    pub pending_counter_notices: i64,
    pub content_awaiting_removal: i64,
    pub content_awaiting_restore: i64,
    pub users_with_active_strikes: i64,
    pub users_with_two_strikes: i64,
    pub total_takedowns_this_month: i64,
    pub total_counter_notices_this_month: i64,
}

/// Repository trait for DMCA notices, counter-notices and strikes.
#[async_trait]
pub trait DmcaRepository: Send + Sync {
    // Notices

    async fn create_notice(&self, notice: &DmcaNotice) -> Result<DmcaNotice, AppError>;

    /// Missing rows are `NotFound`.
    async fn get_notice(&self, id: Uuid) -> Result<DmcaNotice, AppError>;

    /// Notices newest first. `page` is 1-based.
    async fn list_notices(
        &self,
        status: StatusFilter<NoticeStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<DmcaNotice>, AppError>;

    async fn update_notice_status(
        &self,
        id: Uuid,
        status: NoticeStatus,
        reviewed_by: Uuid,
        notes: Option<&str>,
    ) -> Result<(), AppError>;

    async fn pending_notice_count(&self) -> Result<i64, AppError>;

    // Counter-notices

    async fn create_counter_notice(
        &self,
        counter_notice: &DmcaCounterNotice,
    ) -> Result<DmcaCounterNotice, AppError>;

    /// Missing rows are `NotFound`.
    async fn get_counter_notice(&self, id: Uuid) -> Result<DmcaCounterNotice, AppError>;

    /// Counter-notices newest first. `page` is 1-based.
    async fn list_counter_notices(
        &self,
        status: StatusFilter<CounterNoticeStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<DmcaCounterNotice>, AppError>;

    /// Every counter-notice filed against one notice, oldest first.
    async fn list_counter_notices_for_notice(
        &self,
        notice_id: Uuid,
    ) -> Result<Vec<DmcaCounterNotice>, AppError>;

    async fn update_counter_notice_status(
        &self,
        id: Uuid,
        status: CounterNoticeStatus,
        notes: Option<&str>,
    ) -> Result<(), AppError>;

    /// Mark forwarded to the complainant, starting the waiting period.
    async fn mark_counter_notice_forwarded(
        &self,
        id: Uuid,
        waiting_period_ends: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Waiting counter-notices whose period ended with no lawsuit, oldest first.
    async fn counter_notices_awaiting_restore(&self) -> Result<Vec<DmcaCounterNotice>, AppError>;

    // Strikes

    async fn create_strike(&self, strike: &DmcaStrike) -> Result<DmcaStrike, AppError>;

    /// Active strikes, oldest first.
    async fn active_strikes(&self, user_id: Uuid) -> Result<Vec<DmcaStrike>, AppError>;

    /// Every strike, newest first.
    async fn all_strikes(&self, user_id: Uuid) -> Result<Vec<DmcaStrike>, AppError>;

    async fn remove_strike(&self, strike_id: Uuid, reason: &str) -> Result<(), AppError>;

    /// Expire active strikes past `expires_at`. Returns how many changed.
    async fn expire_old_strikes(&self) -> Result<u64, AppError>;

    /// Users holding at least `min_strikes` active strikes, most first.
    async fn users_with_strikes(&self, min_strikes: i64) -> Result<Vec<Uuid>, AppError>;

    async fn dashboard_stats(&self) -> Result<DmcaDashboardStats, AppError>;
}
