//! # Domain Entities
//!
//! Core domain entities of the clip platform. All entities map directly to
//! their corresponding database tables.
//!
//! ## Clips
//!
//! - **StagingClip / PublishedClip**: Discovered clips awaiting promotion and their published form
//! - **Curation**: Strategy filters that select clips for generated playlists
//!
//! ## Community
//!
//! - **Community**: Groups with members, bans, curated clips and discussions
//! - **Playlist**: Ordered clip collections with likes and collaborators
//! - **ClipSubmission**: User-submitted clips awaiting moderation
//!
//! ## Trust & Safety
//!
//! - **Report**: Content reports against clips, comments and users
//! - **CreatorVerification**: Verified creator applications with audit trail
//! - **DmcaNotice / DmcaCounterNotice / DmcaStrike**: Copyright compliance
//! - **Reputation**: Karma, badges, activity counters and trust scores
//!
//! ## Operations
//!
//! - **Revenue**: Subscription analytics
//! - **ClipMirror**: Regional mirror placement
//!
//! ## Repository Traits
//!
//! Each entity family has an associated repository trait defining data access
//! operations. These traits are implemented in the infrastructure layer,
//! following the dependency inversion principle.

mod user;
mod clip;
mod community;
mod playlist;
mod curation;
mod submission;
mod report;
mod verification;
mod dmca;
mod reputation;
mod revenue;
mod mirror;

pub use user::UserSummary;

pub use clip::{
    ClaimRequest, PublishedClip, StagingClip, StagingClipFilter, StagingClipRepository,
    StagingClipSort,
};

pub use community::{
    Community, CommunityBan, CommunityClip, CommunityClipEntry, CommunityClipSort,
    CommunityDiscussion, CommunityMember, CommunityRepository, CommunityRole, CommunitySort,
    DiscussionSort,
};

pub use playlist::{
    CollaboratorPermission, Playlist, PlaylistClipRef, PlaylistCollaborator, PlaylistItem,
    PlaylistRepository, PlaylistVisibility, SHARE_TOKEN_LEN,
};

pub use curation::{CurationFilter, CurationRepository, CurationStrategy, Timeframe};

pub use submission::{
    ClipSubmission, SubmissionRepository, SubmissionStats, SubmissionStatus, SubmissionWithUser,
};

pub use report::{Report, ReportRepository, ReportStatus, ReportableType};

pub use verification::{
    CreatorVerification, IdentityDocumentType, VerificationAuditLog, VerificationRepository,
    VerificationStatus, VerificationWithUser, ACTIVE_APPLICATION_CONSTRAINT,
};

pub use dmca::{
    CounterNoticeStatus, DmcaCounterNotice, DmcaDashboardStats, DmcaNotice, DmcaRepository,
    DmcaStrike, NoticeStatus, StatusFilter, StrikeStatus, STRIKES_FOR_TERMINATION,
    STRIKE_LIFETIME_DAYS,
};

pub use reputation::{
    ActivityKind, KarmaBreakdown, KarmaHistory, LeaderboardEntry, LeaderboardKind,
    ReputationRepository, TrustScoreBreakdown, TrustScoreHistory, TrustScoreInputs,
    TrustScoreUpdate, UserBadge, UserStats, MAX_TRUST_SCORE,
};

pub use revenue::{
    CohortCell, CohortRetention, PlanDistribution, PriceMap, RevenueByMonth, RevenueRepository,
    SubscriberGrowth,
};

pub use mirror::{ClipMirror, MirrorMetric, MirrorMetricType, MirrorRepository, MirrorStatus};
