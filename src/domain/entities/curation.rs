//! Automated playlist curation.
//!
//! Each strategy selects published clip IDs using engagement heuristics on
//! top of a shared filter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Recency window applied to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    /// Parse a timeframe name. Unknown names mean no window.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Predicate on `c.created_at` for this window.
    pub fn created_after_clause(&self) -> &'static str {
        match self {
            Self::Hour => "c.created_at > NOW() - INTERVAL '1 hour'",
            Self::Day => "c.created_at > NOW() - INTERVAL '1 day'",
            Self::Week => "c.created_at > NOW() - INTERVAL '7 days'",
            Self::Month => "c.created_at > NOW() - INTERVAL '30 days'",
            Self::Year => "c.created_at > NOW() - INTERVAL '365 days'",
        }
    }
}

/// Filter shared by every curation strategy.
///
/// Removed and hidden clips are always excluded; every other field only
/// narrows the candidate set when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurationFilter {
    pub exclude_nsfw: bool,
    pub game_id: Option<String>,
    pub broadcaster_id: Option<String>,

    /// Required tag slug
    pub tag: Option<String>,

    /// Tag slugs that disqualify a clip
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    pub language: Option<String>,
    pub min_vote_score: Option<i32>,
    pub min_view_count: Option<i32>,
    pub top_10k_streamers: bool,
    pub timeframe: Option<Timeframe>,
}

/// Named curation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationStrategy {
    /// High retention, low views
    SleeperHits,
    /// Fastest engagement per hour in the last 48 hours
    ViralVelocity,
    /// Highest favorite-to-view ratio
    CommunityFavorites,
    /// Long average watch time, not trending
    DeepCuts,
    /// Best clips from creators with few clips
    FreshFaces,
    /// Nearest neighbours of a seed clip by embedding
    SimilarVibes,
    /// Best clips across a set of games
    CrossGameHits,
    /// Heavy comment activity relative to views
    Controversial,
    /// Clips watched in long sessions
    BingeWorthy,
    /// Creators whose recent clips beat their average
    RisingStars,
}

impl CurationStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sleeper_hits" => Some(Self::SleeperHits),
            "viral_velocity" => Some(Self::ViralVelocity),
            "community_favorites" => Some(Self::CommunityFavorites),
            "deep_cuts" => Some(Self::DeepCuts),
            "fresh_faces" => Some(Self::FreshFaces),
            "similar_vibes" => Some(Self::SimilarVibes),
            "cross_game_hits" => Some(Self::CrossGameHits),
            "controversial" => Some(Self::Controversial),
            "binge_worthy" => Some(Self::BingeWorthy),
            "rising_stars" => Some(Self::RisingStars),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SleeperHits => "sleeper_hits",
            Self::ViralVelocity => "viral_velocity",
            Self::CommunityFavorites => "community_favorites",
            Self::DeepCuts => "deep_cuts",
            Self::FreshFaces => "fresh_faces",
            Self::SimilarVibes => "similar_vibes",
            Self::CrossGameHits => "cross_game_hits",
            Self::Controversial => "controversial",
            Self::BingeWorthy => "binge_worthy",
            Self::RisingStars => "rising_stars",
        }
    }

    /// Strategies that need input beyond the filter.
    pub fn needs_seed(&self) -> bool {
        matches!(self, Self::SimilarVibes | Self::CrossGameHits)
    }
}

/// Repository trait for curation queries. Every method returns at most
/// `limit` clip IDs, with limits outside `1..=100` reset to 25.
#[async_trait]
pub trait CurationRepository: Send + Sync {
    async fn sleeper_hits(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn viral_velocity(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn community_favorites(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn deep_cuts(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn fresh_faces(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    /// Clips closest to `seed_clip_id`. The timeframe is ignored.
    async fn similar_vibes(
        &self,
        filter: &CurationFilter,
        seed_clip_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Uuid>, AppError>;

    async fn cross_game_hits(
        &self,
        filter: &CurationFilter,
        game_ids: &[String],
        limit: i64,
    ) -> Result<Vec<Uuid>, AppError>;

    async fn controversial(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn binge_worthy(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;

    async fn rising_stars(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError>;
}
