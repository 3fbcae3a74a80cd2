//! # Domain Services
//!
//! Domain services encapsulate business rules that don't naturally belong to
//! a single entity. They are pure functions of their inputs.
//!
//! ## Services
//!
//! - **TrustScoreService**: Trust score breakdown from raw counters
//! - **CohortService**: Subscription cohort retention bucketing
//! - **BadgeService**: Automatic badge eligibility

pub mod badges;
mod cohort;
mod trust_score;

pub use badges::BadgeService;
pub use cohort::{CohortService, SECONDS_PER_MONTH};
pub use trust_score::TrustScoreService;
