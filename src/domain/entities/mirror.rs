//! Regional clip mirror entities and repository trait.
//!
//! Maps to the `clip_mirrors` and `mirror_metrics` tables. A clip has at
//! most one mirror per region.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MirrorStatus {
    #[default]
    Pending,
    Active,
    Failed,
    Expired,
}

impl MirrorStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            "failed" => Self::Failed,
            "expired" => Self::Expired,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

/// A copy of a clip served from one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMirror {
    pub id: Uuid,
    pub clip_id: Uuid,
    pub region: String,
    pub mirror_url: String,
    pub status: MirrorStatus,
    pub storage_provider: String,
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub access_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl ClipMirror {
    pub fn new(
        clip_id: Uuid,
        region: impl Into<String>,
        mirror_url: impl Into<String>,
        storage_provider: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            clip_id,
            region: region.into(),
            mirror_url: mirror_url.into(),
            status: MirrorStatus::Pending,
            storage_provider: storage_provider.into(),
            size_bytes: None,
            created_at: Utc::now(),
            last_accessed_at: None,
            access_count: 0,
            expires_at: None,
            failure_reason: None,
        }
    }

    /// Expire `ttl` after creation.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.created_at + ttl);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }
}

/// What a mirror metric measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMetricType {
    /// Served from a mirror
    Access,
    /// Fell back to the origin
    Failover,
    Replication,
}

impl MirrorMetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Failover => "failover",
            Self::Replication => "replication",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorMetric {
    pub clip_id: Uuid,
    pub region: String,
    pub metric_type: MirrorMetricType,
    pub metric_value: f64,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl MirrorMetric {
    pub fn new(clip_id: Uuid, region: impl Into<String>, metric_type: MirrorMetricType, value: f64) -> Self {
        Self {
            clip_id,
            region: region.into(),
            metric_type,
            metric_value: value,
            metadata: None,
        }
    }
}

/// Repository trait for clip mirrors.
#[async_trait]
pub trait MirrorRepository: Send + Sync {
    /// A second mirror for the same clip and region yields `Conflict`.
    async fn create(&self, mirror: &ClipMirror) -> Result<ClipMirror, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ClipMirror>, AppError>;

    async fn get_by_clip_and_region(&self, clip_id: Uuid, region: &str) -> Result<Option<ClipMirror>, AppError>;

    /// Mirrors of a clip, newest first.
    async fn list_by_clip(&self, clip_id: Uuid) -> Result<Vec<ClipMirror>, AppError>;

    /// Active mirrors in a region, newest first.
    async fn list_active_by_region(&self, region: &str) -> Result<Vec<ClipMirror>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: MirrorStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), AppError>;

    /// Bump the access counter and stamp the access time.
    async fn record_access(&self, id: Uuid) -> Result<(), AppError>;

    /// Delete mirrors past `expires_at`. Returns how many were removed.
    async fn delete_expired(&self) -> Result<u64, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn record_metric(&self, metric: &MirrorMetric) -> Result<(), AppError>;

    /// Percentage of access and failover volume served by mirrors since `since`.
    async fn hit_rate(&self, since: DateTime<Utc>) -> Result<f64, AppError>;

    /// Live clips with at least `threshold` views or votes and fewer than
    /// `max_active_mirrors` active mirrors, most viewed first.
    async fn popular_clips_for_mirroring(
        &self,
        threshold: i64,
        limit: i64,
        max_active_mirrors: i64,
    ) -> Result<Vec<Uuid>, AppError>;
}
