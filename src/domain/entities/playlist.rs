//! Playlist entities and repository trait.
//!
//! Maps to the `playlists`, `playlist_items`, `playlist_likes` and
//! `playlist_collaborators` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::PublishedClip;
use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// Length of generated share tokens.
pub const SHARE_TOKEN_LEN: usize = 16;

/// Who can see a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistVisibility {
    #[default]
    Private,
    Public,
    /// Reachable by share token, not listed publicly
    Unlisted,
}

impl PlaylistVisibility {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "public" => Self::Public,
            "unlisted" => Self::Unlisted,
            _ => Self::Private,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
            Self::Unlisted => "unlisted",
        }
    }
}

impl std::fmt::Display for PlaylistVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-curated, ordered list of clips.
///
/// Maps to the `playlists` table. Soft-deleted playlists keep their row
/// with `deleted_at` set and are invisible to every lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub visibility: PlaylistVisibility,
    pub share_token: Option<String>,
    pub view_count: i32,
    pub share_count: i32,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Playlist {
    /// Create a new private playlist.
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            cover_url: None,
            visibility: PlaylistVisibility::Private,
            share_token: None,
            view_count: 0,
            share_count: 0,
            like_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn with_visibility(mut self, visibility: PlaylistVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Random alphanumeric token for share links.
    pub fn generate_share_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SHARE_TOKEN_LEN)
            .map(char::from)
            .collect()
    }
}

/// A clip's position in a playlist. `order_index` values of one playlist
/// form the contiguous range `0..n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: i64,
    pub playlist_id: Uuid,
    pub clip_id: Uuid,
    pub order_index: i32,
    pub added_at: DateTime<Utc>,
}

/// A playlist entry with the full clip it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistClipRef {
    #[serde(flatten)]
    pub clip: PublishedClip,
    #[serde(rename = "order")]
    pub order_index: i32,
}

/// What a collaborator may do with a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorPermission {
    #[default]
    View,
    Edit,
    Admin,
}

impl CollaboratorPermission {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "edit" => Self::Edit,
            "admin" => Self::Admin,
            _ => Self::View,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }

    pub fn can_edit(&self) -> bool {
        *self >= Self::Edit
    }
}

/// A user granted access to someone else's playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistCollaborator {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub user_id: Uuid,
    pub permission: CollaboratorPermission,
    pub invited_by: Option<Uuid>,
    pub invited_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistCollaborator {
    pub fn new(
        playlist_id: Uuid,
        user_id: Uuid,
        permission: CollaboratorPermission,
        invited_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            playlist_id,
            user_id,
            permission,
            invited_by,
            invited_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository trait for playlists, their items, likes and collaborators.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Create a playlist.
    async fn create(&self, playlist: &Playlist) -> Result<Playlist, AppError>;

    /// Create a playlist and copy every item of `source_playlist_id` into it,
    /// preserving order, in one transaction.
    async fn create_with_clips(
        &self,
        playlist: &Playlist,
        source_playlist_id: Uuid,
    ) -> Result<Playlist, AppError>;

    /// Find a live playlist by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Playlist>, AppError>;

    /// Find a live playlist by share token.
    async fn find_by_share_token(&self, token: &str) -> Result<Option<Playlist>, AppError>;

    /// Assign a fresh share token and return it.
    async fn regenerate_share_token(&self, id: Uuid) -> Result<String, AppError>;

    /// Update title, description, cover and visibility.
    async fn update(&self, playlist: &Playlist) -> Result<Playlist, AppError>;

    /// Mark a playlist deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError>;

    /// List a user's playlists, newest first.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Playlist>, AppError>;

    /// List public playlists, most liked first.
    async fn list_public(&self, limit: i64, offset: i64) -> Result<Page<Playlist>, AppError>;

    /// Append a clip at the end. Returns false if it was already present.
    async fn add_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<bool, AppError>;

    /// Remove a clip and close the gap in the ordering.
    async fn remove_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<(), AppError>;

    /// List clips in playlist order.
    async fn list_clips(
        &self,
        playlist_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<PlaylistClipRef>, AppError>;

    /// Raw items in playlist order.
    async fn list_items(&self, playlist_id: Uuid) -> Result<Vec<PlaylistItem>, AppError>;

    /// Number of clips in a playlist.
    async fn clip_count(&self, playlist_id: Uuid) -> Result<i64, AppError>;

    /// Check whether a clip is in a playlist.
    async fn has_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<bool, AppError>;

    /// Set each clip's index to its position in `clip_ids`.
    async fn reorder_clips(&self, playlist_id: Uuid, clip_ids: &[Uuid]) -> Result<(), AppError>;

    /// Like a playlist. Returns false if already liked.
    async fn like(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError>;

    /// Remove a like. Returns false if there was none.
    async fn unlike(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError>;

    /// Check whether a user liked a playlist.
    async fn is_liked(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError>;

    /// Add a collaborator, or change the permission of an existing one.
    async fn add_collaborator(
        &self,
        collaborator: &PlaylistCollaborator,
    ) -> Result<PlaylistCollaborator, AppError>;

    /// Remove a collaborator.
    async fn remove_collaborator(&self, playlist_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    /// List a playlist's collaborators in invitation order.
    async fn list_collaborators(&self, playlist_id: Uuid) -> Result<Vec<PlaylistCollaborator>, AppError>;

    /// Find one collaborator.
    async fn find_collaborator(
        &self,
        playlist_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlaylistCollaborator>, AppError>;
}
