//! Staging and published clip entities and the staging repository trait.
//!
//! Maps to the `discovery_clips` (staging) and `clips` (published) tables.
//! A clip moves from staging to published exactly once, through a claim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// An externally discovered clip awaiting a claim.
///
/// Maps to the `discovery_clips` table:
/// - id: UUID PRIMARY KEY
/// - twitch_clip_id: TEXT NOT NULL UNIQUE
/// - twitch_clip_url, embed_url, title, creator_name, broadcaster_name: TEXT NOT NULL
/// - creator_id, broadcaster_id, game_id, game_name, language, thumbnail_url: TEXT NULL
/// - duration: DOUBLE PRECISION NULL
/// - view_count: INTEGER NOT NULL DEFAULT 0
/// - created_at, imported_at: TIMESTAMPTZ NOT NULL
/// - is_nsfw, is_removed, is_hidden: BOOLEAN NOT NULL DEFAULT FALSE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingClip {
    pub id: Uuid,
    pub twitch_clip_id: String,
    pub twitch_clip_url: String,
    pub embed_url: String,
    pub title: String,
    pub creator_name: String,
    pub creator_id: Option<String>,
    pub broadcaster_name: String,
    pub broadcaster_id: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub language: Option<String>,
    pub thumbnail_url: Option<String>,

    /// Length in seconds
    pub duration: Option<f64>,

    pub view_count: i32,

    /// When the clip was created on the source platform
    pub created_at: DateTime<Utc>,

    /// When the ingestion job stored it
    pub imported_at: DateTime<Utc>,

    pub is_nsfw: bool,
    pub is_removed: bool,
    pub is_hidden: bool,
}

impl StagingClip {
    /// Build the published record a claim produces.
    ///
    /// Non-empty overrides replace the title and broadcaster name; counters
    /// start at zero and ownership goes to the claiming user.
    pub fn into_published(self, request: &ClaimRequest, now: DateTime<Utc>) -> PublishedClip {
        let title = non_empty(request.custom_title.as_deref()).unwrap_or(self.title);
        let broadcaster_name = non_empty(request.broadcaster_name_override.as_deref())
            .unwrap_or(self.broadcaster_name);

        PublishedClip {
            id: self.id,
            twitch_clip_id: self.twitch_clip_id,
            twitch_clip_url: self.twitch_clip_url,
            embed_url: self.embed_url,
            title,
            creator_name: self.creator_name,
            creator_id: self.creator_id,
            broadcaster_name,
            broadcaster_id: self.broadcaster_id,
            game_id: self.game_id,
            game_name: self.game_name,
            language: self.language,
            thumbnail_url: self.thumbnail_url,
            duration: self.duration,
            view_count: self.view_count,
            created_at: self.created_at,
            imported_at: now,
            vote_score: 0,
            comment_count: 0,
            favorite_count: 0,
            is_featured: false,
            is_nsfw: request.is_nsfw,
            is_removed: false,
            removed_reason: None,
            is_hidden: false,
            submitted_by_user_id: Some(request.user_id),
            submitted_at: Some(now),
            trending_score: 0.0,
            hot_score: 0.0,
            dmca_removed: false,
            dmca_notice_id: None,
            dmca_removed_at: None,
            dmca_reinstated_at: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// A published, owned clip.
///
/// Maps to the `clips` table. `twitch_clip_id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedClip {
    pub id: Uuid,
    pub twitch_clip_id: String,
    pub twitch_clip_url: String,
    pub embed_url: String,
    pub title: String,
    pub creator_name: String,
    pub creator_id: Option<String>,
    pub broadcaster_name: String,
    pub broadcaster_id: Option<String>,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub language: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration: Option<f64>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub imported_at: DateTime<Utc>,

    // Engagement counters
    pub vote_score: i32,
    pub comment_count: i32,
    pub favorite_count: i32,

    // Moderation flags
    pub is_featured: bool,
    pub is_nsfw: bool,
    pub is_removed: bool,
    pub removed_reason: Option<String>,
    pub is_hidden: bool,

    /// User who claimed or submitted the clip
    pub submitted_by_user_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,

    pub trending_score: f64,
    pub hot_score: f64,

    // DMCA state
    pub dmca_removed: bool,
    pub dmca_notice_id: Option<Uuid>,
    pub dmca_removed_at: Option<DateTime<Utc>>,
    pub dmca_reinstated_at: Option<DateTime<Utc>>,
}

impl PublishedClip {
    /// Visible in public listings.
    pub fn is_visible(&self) -> bool {
        !self.is_removed && !self.is_hidden && !self.dmca_removed
    }
}

/// Input to a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub twitch_clip_id: String,
    pub user_id: Uuid,

    /// Replaces the staged title when non-empty
    pub custom_title: Option<String>,

    /// Replaces the staged broadcaster name when non-empty
    pub broadcaster_name_override: Option<String>,

    pub is_nsfw: bool,
}

impl ClaimRequest {
    pub fn new(twitch_clip_id: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            twitch_clip_id: twitch_clip_id.into(),
            user_id,
            custom_title: None,
            broadcaster_name_override: None,
            is_nsfw: false,
        }
    }
}

/// Optional predicates for listing staged clips. Unset fields do not narrow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingClipFilter {
    pub game_id: Option<String>,
    pub broadcaster_id: Option<String>,
    pub creator_id: Option<String>,

    /// Case-insensitive title substring
    pub search: Option<String>,

    /// Matches the exact tag, its primary subtag ("en" for "en-GB"), or untagged clips
    pub language: Option<String>,

    /// Only broadcasters listed in `top_streamers`
    pub top_10k_streamers: bool,

    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,

    /// Include clips flagged hidden
    pub show_hidden: bool,
}

/// Orderings for staged clip listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StagingClipSort {
    /// Most recently created first
    #[default]
    New,
    /// Most viewed first
    Views,
    /// Currently an alias of `Views`
    Trending,
}

impl StagingClipSort {
    /// Parse a sort name. Unknown names fall back to `New`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "views" => Self::Views,
            "trending" => Self::Trending,
            _ => Self::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Views => "views",
            Self::Trending => "trending",
        }
    }
}

impl std::fmt::Display for StagingClipSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repository trait for staged clips and the claim workflow.
#[async_trait]
pub trait StagingClipRepository: Send + Sync {
    /// Stage a discovered clip. Fails with `Conflict` if the external id is
    /// already staged or already published.
    async fn create(&self, clip: &StagingClip) -> Result<StagingClip, AppError>;

    /// Check whether a staged clip exists for the external id.
    async fn exists_by_twitch_clip_id(&self, twitch_clip_id: &str) -> Result<bool, AppError>;

    /// Find a non-removed staged clip by external id.
    async fn find_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<StagingClip>, AppError>;

    /// Find a non-removed staged clip by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StagingClip>, AppError>;

    /// Delete a staged clip.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Delete a staged clip by external id.
    async fn delete_by_twitch_clip_id(&self, twitch_clip_id: &str) -> Result<(), AppError>;

    /// Move a staged clip into the published table exactly once.
    ///
    /// Concurrent claims for the same external id produce one success; the
    /// others fail with `Conflict` without waiting on the winner's lock.
    async fn claim(&self, request: &ClaimRequest) -> Result<PublishedClip, AppError>;

    /// List staged clips. The total covers the whole filtered set.
    async fn list(
        &self,
        filter: &StagingClipFilter,
        sort: StagingClipSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<StagingClip>, AppError>;

    /// Find a published clip by external id.
    async fn find_published_by_twitch_clip_id(
        &self,
        twitch_clip_id: &str,
    ) -> Result<Option<PublishedClip>, AppError>;
}
