//! Community entities and repository trait.
//!
//! Maps to the `communities`, `community_members`, `community_bans`,
//! `community_clips` and `community_discussions` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::PublishedClip;
use crate::shared::error::AppError;
use crate::shared::pagination::Page;

/// A user-created community.
///
/// Maps to the `communities` table:
/// - id: UUID PRIMARY KEY
/// - name: TEXT NOT NULL
/// - slug: TEXT NOT NULL UNIQUE
/// - description, icon, rules: TEXT NULL
/// - owner_id: UUID NOT NULL REFERENCES users(id)
/// - is_public: BOOLEAN NOT NULL DEFAULT TRUE
/// - member_count: INTEGER NOT NULL DEFAULT 0
/// - created_at, updated_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,

    /// URL-safe unique handle
    pub slug: String,

    pub description: Option<String>,
    pub icon: Option<String>,
    pub owner_id: Uuid,
    pub is_public: bool,

    /// Maintained by member add/remove/ban operations
    pub member_count: i32,

    pub rules: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Community {
    /// Create a new public community owned by `owner_id`.
    pub fn new(name: impl Into<String>, slug: impl Into<String>, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            icon: None,
            owner_id,
            is_public: true,
            member_count: 0,
            rules: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Role of a member within a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunityRole {
    Admin,
    Mod,
    #[default]
    Member,
}

impl CommunityRole {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            "mod" => Self::Mod,
            _ => Self::Member,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Mod => "mod",
            Self::Member => "member",
        }
    }

    /// Admins and mods may moderate.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Admin | Self::Mod)
    }
}

impl std::fmt::Display for CommunityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's membership in a community. Unique per (community_id, user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMember {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub role: CommunityRole,
    pub joined_at: DateTime<Utc>,
}

impl CommunityMember {
    pub fn new(community_id: Uuid, user_id: Uuid, role: CommunityRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// A ban of a user from a community. Unique per (community_id, banned_user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityBan {
    pub id: Uuid,
    pub community_id: Uuid,
    pub banned_user_id: Uuid,
    pub banned_by_user_id: Option<Uuid>,
    pub reason: Option<String>,
    pub banned_at: DateTime<Utc>,
}

impl CommunityBan {
    pub fn new(community_id: Uuid, banned_user_id: Uuid, banned_by_user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            community_id,
            banned_user_id,
            banned_by_user_id: Some(banned_by_user_id),
            reason: None,
            banned_at: Utc::now(),
        }
    }
}

/// A clip shared into a community feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityClip {
    pub id: Uuid,
    pub community_id: Uuid,
    pub clip_id: Uuid,
    pub added_by_user_id: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

/// A community clip together with the clip it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityClipEntry {
    #[serde(flatten)]
    pub community_clip: CommunityClip,
    pub clip: PublishedClip,
}

/// A discussion thread inside a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityDiscussion {
    pub id: Uuid,
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub is_resolved: bool,
    pub vote_score: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommunityDiscussion {
    pub fn new(community_id: Uuid, user_id: Uuid, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            community_id,
            user_id,
            title: title.into(),
            content: content.into(),
            is_pinned: false,
            is_resolved: false,
            vote_score: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Orderings for community listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunitySort {
    #[default]
    New,
    Members,
    Name,
}

impl CommunitySort {
    /// Parse a sort name. Unknown names fall back to `New`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "members" => Self::Members,
            "name" => Self::Name,
            _ => Self::New,
        }
    }
}

/// Orderings for a community's clip feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunityClipSort {
    #[default]
    Recent,
    Trending,
}

impl CommunityClipSort {
    /// Parse a sort name. Unknown names fall back to `Recent`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trending" => Self::Trending,
            _ => Self::Recent,
        }
    }
}

/// Orderings for discussion threads. Pinned threads always come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionSort {
    /// Newest thread first
    #[default]
    Newest,
    /// Highest vote score first
    Trending,
    /// Most recently updated first
    Recent,
}

impl DiscussionSort {
    /// Parse a sort name. Unknown names fall back to `Newest`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trending" => Self::Trending,
            "recent" => Self::Recent,
            _ => Self::Newest,
        }
    }
}

/// Repository trait for communities, their members, bans, clips and discussions.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Create a community. A taken slug yields `Conflict`.
    async fn create(&self, community: &Community) -> Result<Community, AppError>;

    /// Find a community by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>, AppError>;

    /// Find a community by slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Community>, AppError>;

    /// Update name, slug, description, icon, visibility and rules.
    async fn update(&self, community: &Community) -> Result<Community, AppError>;

    /// Delete a community.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// List communities.
    async fn list(
        &self,
        public_only: bool,
        sort: CommunitySort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Community>, AppError>;

    /// Case-insensitive name search, largest communities first.
    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Page<Community>, AppError>;

    /// Add a member. Fails with `Conflict` if already a member or banned.
    async fn add_member(&self, member: &CommunityMember) -> Result<CommunityMember, AppError>;

    /// Remove a member.
    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    /// Find a membership.
    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityMember>, AppError>;

    /// List members, newest first, optionally restricted to one role.
    async fn list_members(
        &self,
        community_id: Uuid,
        role: Option<CommunityRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityMember>, AppError>;

    /// Change a member's role.
    async fn update_member_role(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> Result<(), AppError>;

    /// Check if a user is a member.
    async fn is_member(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Check if a user is banned.
    async fn is_banned(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Ban a user, removing any membership in the same transaction.
    async fn ban_member(&self, ban: &CommunityBan) -> Result<CommunityBan, AppError>;

    /// Lift a ban.
    async fn unban_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    /// Find a ban by ID.
    async fn find_ban(&self, ban_id: Uuid) -> Result<Option<CommunityBan>, AppError>;

    /// List a community's bans, newest first.
    async fn list_bans(
        &self,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityBan>, AppError>;

    /// Share a clip into a community. A repeat yields `Conflict`.
    async fn add_clip(&self, community_clip: &CommunityClip) -> Result<CommunityClip, AppError>;

    /// Remove a shared clip.
    async fn remove_clip(&self, community_id: Uuid, clip_id: Uuid) -> Result<(), AppError>;

    /// List a community's clips with clip details.
    async fn list_clips(
        &self,
        community_id: Uuid,
        sort: CommunityClipSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityClipEntry>, AppError>;

    /// Create a discussion thread.
    async fn create_discussion(
        &self,
        discussion: &CommunityDiscussion,
    ) -> Result<CommunityDiscussion, AppError>;

    /// Find a discussion thread.
    async fn find_discussion(&self, id: Uuid) -> Result<Option<CommunityDiscussion>, AppError>;

    /// Update title, content, pinned and resolved flags.
    async fn update_discussion(
        &self,
        discussion: &CommunityDiscussion,
    ) -> Result<CommunityDiscussion, AppError>;

    /// Delete a discussion thread.
    async fn delete_discussion(&self, id: Uuid) -> Result<(), AppError>;

    /// List a community's discussions, pinned first.
    async fn list_discussions(
        &self,
        community_id: Uuid,
        sort: DiscussionSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityDiscussion>, AppError>;
}
