//! Clip submission entity and repository trait.
//!
//! Maps to the `clip_submissions` table. Aggregate counters come from the
//! `submission_stats` view.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// Review state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's request to publish a clip, awaiting moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub twitch_clip_id: String,
    pub twitch_clip_url: String,
    pub title: Option<String>,
    pub custom_title: Option<String>,
    pub broadcaster_name_override: Option<String>,
    pub tags: Vec<String>,
    pub is_nsfw: bool,
    pub submission_reason: Option<String>,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Metadata fetched from Twitch at submission time
    pub creator_name: Option<String>,
    pub creator_id: Option<String>,
    pub broadcaster_name: Option<String>,
    pub broadcaster_id: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub view_count: i32,
}

impl ClipSubmission {
    /// Create a pending submission with no Twitch metadata yet.
    pub fn new(
        user_id: Uuid,
        twitch_clip_id: impl Into<String>,
        twitch_clip_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            twitch_clip_id: twitch_clip_id.into(),
            twitch_clip_url: twitch_clip_url.into(),
            title: None,
            custom_title: None,
            broadcaster_name_override: None,
            tags: Vec::new(),
            is_nsfw: false,
            submission_reason: None,
            status: SubmissionStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
            creator_name: None,
            creator_id: None,
            broadcaster_name: None,
            broadcaster_id: None,
            game_id: None,
            game_name: None,
            thumbnail_url: None,
            duration: None,
            view_count: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

/// A submission decorated with its submitter, for moderation queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionWithUser {
    #[serde(flatten)]
    pub submission: ClipSubmission,
    pub user: UserSummary,
}

/// Per-user submission counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionStats {
    pub user_id: Uuid,
    pub total_submissions: i64,
    pub approved_count: i64,
    pub rejected_count: i64,
    pub pending_count: i64,
    pub approval_rate: f64,
}

impl SubmissionStats {
    /// Stats for a user who never submitted anything.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            total_submissions: 0,
            approved_count: 0,
            rejected_count: 0,
            pending_count: 0,
            approval_rate: 0.0,
        }
    }
}

/// Repository trait for clip submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Create a submission.
    async fn create(&self, submission: &ClipSubmission) -> Result<ClipSubmission, AppError>;

    /// Get a submission. Missing rows are `NotFound`.
    async fn get_by_id(&self, id: Uuid) -> Result<ClipSubmission, AppError>;

    /// Most recent submission of a Twitch clip.
    async fn find_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<ClipSubmission>, AppError>;

    /// A user's submissions, newest first. `page` is 1-based.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Page<ClipSubmission>, AppError>;

    /// Pending submissions, oldest first, with their submitters.
    async fn list_pending(&self, page: i64, limit: i64) -> Result<Page<SubmissionWithUser>, AppError>;

    /// Record a moderation decision.
    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        reviewed_by: Uuid,
        rejection_reason: Option<&str>,
    ) -> Result<(), AppError>;

    /// Submissions made by a user after `since`.
    async fn count_user_submissions(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;

    /// Submission counters. Users with no submissions get zeroed stats.
    async fn user_stats(&self, user_id: Uuid) -> Result<SubmissionStats, AppError>;
}
