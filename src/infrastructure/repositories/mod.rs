//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! This module provides concrete implementations of the repository traits
//! defined in the domain layer. Each repository handles data access for
//! one entity family.
//!
//! ## Available Repositories
//!
//! - **StagingClipRepository** - Discovered clips and their promotion into `clips`
//! - **CommunityRepository** - Communities, members, bans, clips and discussions
//! - **PlaylistRepository** - Playlists, ordered items, likes and collaborators
//! - **CurationRepository** - Strategy queries behind generated playlists
//! - **SubmissionRepository** - User clip submissions and moderation
//! - **ReportRepository** - Content reports
//! - **VerificationRepository** - Creator verification applications and audit log
//! - **DmcaRepository** - Takedown notices, counter-notices and strikes
//! - **ReputationRepository** - Karma, badges, activity and trust scores
//! - **RevenueRepository** - Subscription analytics
//! - **MirrorRepository** - Regional clip mirrors
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{
//!     PgCommunityRepository, PgPlaylistRepository, PgStagingClipRepository,
//! };
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let staging_repo = PgStagingClipRepository::new(pool.clone());
//!     let community_repo = PgCommunityRepository::new(pool.clone());
//!     let playlist_repo = PgPlaylistRepository::new(pool.clone());
//! }
//! ```

// Shared row types and column lists; must precede their users
#[macro_use]
mod clip_row;
#[macro_use]
mod user_row;

// Clip lifecycle
pub mod staging_clip_repository;
pub mod curation_repository;

// Community features
pub mod community_repository;
pub mod playlist_repository;
pub mod submission_repository;

// Trust and safety
pub mod report_repository;
pub mod verification_repository;
pub mod dmca_repository;
pub mod reputation_repository;

// Operations
pub mod revenue_repository;
pub mod mirror_repository;

pub use staging_clip_repository::PgStagingClipRepository;
pub use curation_repository::PgCurationRepository;
pub use community_repository::PgCommunityRepository;
pub use playlist_repository::PgPlaylistRepository;
pub use submission_repository::PgSubmissionRepository;
pub use report_repository::PgReportRepository;
pub use verification_repository::PgVerificationRepository;
pub use dmca_repository::PgDmcaRepository;
pub use reputation_repository::PgReputationRepository;
pub use revenue_repository::PgRevenueRepository;
pub use mirror_repository::PgMirrorRepository;
