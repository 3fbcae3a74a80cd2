//! Creator verification entities and repository trait.
//!
//! Maps to the `creator_verifications` and `verification_audit_logs` tables.
//! A user may hold at most one active application; the schema enforces this
//! with the `unique_active_application` constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::UserSummary;
use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// Name of the constraint guarding one active application per user.
pub const ACTIVE_APPLICATION_CONSTRAINT: &str = "unique_active_application";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Revoked,
}

impl VerificationStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "revoked" => Self::Revoked,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocumentType {
    GovernmentId,
    Passport,
    Other,
}

impl IdentityDocumentType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "government_id" => Some(Self::GovernmentId),
            "passport" => Some(Self::Passport),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovernmentId => "government_id",
            Self::Passport => "passport",
            Self::Other => "other",
        }
    }
}

/// A creator's application for a verified badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: VerificationStatus,

    // Application
    pub application_reason: Option<String>,
    pub identity_document_type: Option<IdentityDocumentType>,
    pub identity_verified: bool,
    pub identity_verified_at: Option<DateTime<Utc>>,
    pub identity_verified_by: Option<Uuid>,

    // Eligibility
    pub follower_count: Option<i32>,
    pub content_creation_months: Option<i32>,
    pub platform_username: Option<String>,
    pub platform_url: Option<String>,

    // Review
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreatorVerification {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: VerificationStatus::Pending,
            application_reason: None,
            identity_document_type: None,
            identity_verified: false,
            identity_verified_at: None,
            identity_verified_by: None,
            follower_count: None,
            content_creation_months: None,
            platform_username: None,
            platform_url: None,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A verification joined with its applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationWithUser {
    #[serde(flatten)]
    pub verification: CreatorVerification,
    pub user: UserSummary,
}

/// One action taken on a verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAuditLog {
    pub id: Uuid,
    pub verification_id: Uuid,
    pub action: String,
    pub performed_by: Option<Uuid>,
    pub previous_status: Option<VerificationStatus>,
    pub new_status: Option<VerificationStatus>,
    pub notes: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationAuditLog {
    pub fn new(verification_id: Uuid, action: impl Into<String>, performed_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            verification_id,
            action: action.into(),
            performed_by,
            previous_status: None,
            new_status: None,
            notes: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_transition(mut self, from: VerificationStatus, to: VerificationStatus) -> Self {
        self.previous_status = Some(from);
        self.new_status = Some(to);
        self
    }
}

/// Repository trait for creator verification.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Create an application. A second active application yields `Conflict`.
    async fn create(&self, verification: &CreatorVerification) -> Result<CreatorVerification, AppError>;

    /// Get by ID. Missing rows are `NotFound`.
    async fn get_by_id(&self, id: Uuid) -> Result<CreatorVerification, AppError>;

    /// The user's most recent application. Missing rows are `NotFound`.
    async fn latest_for_user(&self, user_id: Uuid) -> Result<CreatorVerification, AppError>;

    /// Applications newest first, with their applicants.
    async fn list(
        &self,
        status: Option<VerificationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<VerificationWithUser>, AppError>;

    /// Persist review and identity fields.
    async fn update(&self, verification: &CreatorVerification) -> Result<CreatorVerification, AppError>;

    async fn create_audit_log(&self, log: &VerificationAuditLog) -> Result<VerificationAuditLog, AppError>;

    /// Audit entries newest first.
    async fn list_audit_logs(
        &self,
        verification_id: Uuid,
        limit: i64,
    ) -> Result<Vec<VerificationAuditLog>, AppError>;
}
