//! Content report entity and repository trait.
//!
//! Maps to the `reports` table. A report targets a clip, comment or user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// Kind of content a report targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportableType {
    #[default]
    Clip,
    Comment,
    User,
}

impl ReportableType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "comment" => Self::Comment,
            "user" => Self::User,
            _ => Self::Clip,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::Comment => "comment",
            Self::User => "user",
        }
    }
}

/// Moderation state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Actioned,
    Dismissed,
}

impl ReportStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "reviewed" => Self::Reviewed,
            "actioned" => Self::Actioned,
            "dismissed" => Self::Dismissed,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Actioned => "actioned",
            Self::Dismissed => "dismissed",
        }
    }

    /// Pending and reviewed reports still block duplicates.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Reviewed)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reportable_type: ReportableType,
    pub reportable_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        reporter_id: Uuid,
        reportable_type: ReportableType,
        reportable_id: Uuid,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reporter_id,
            reportable_type,
            reportable_id,
            reason: reason.into(),
            description: None,
            status: ReportStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for reports.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> Result<Report, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Report>, AppError>;

    /// Reports newest first, optionally filtered. `page` is 1-based.
    async fn list(
        &self,
        status: Option<ReportStatus>,
        reportable_type: Option<ReportableType>,
        page: i64,
        limit: i64,
    ) -> Result<Page<Report>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ReportStatus,
        reviewer_id: Uuid,
    ) -> Result<(), AppError>;

    /// Whether the reporter already has an open report on the same target.
    async fn has_open_duplicate(
        &self,
        reporter_id: Uuid,
        reportable_type: ReportableType,
        reportable_id: Uuid,
    ) -> Result<bool, AppError>;

    /// Reports filed by a user since `since`.
    async fn count_by_reporter(&self, reporter_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;

    /// Every report on one target, newest first.
    async fn list_for_reportable(
        &self,
        reportable_type: ReportableType,
        reportable_id: Uuid,
    ) -> Result<Vec<Report>, AppError>;
}
