//! Automatic badge eligibility.

use crate::domain::entities::UserStats;

pub const INFLUENCER: &str = "influencer";
pub const TRUSTED_USER: &str = "trusted_user";
pub const VETERAN: &str = "veteran";
pub const CONVERSATIONALIST: &str = "conversationalist";
pub const CURATOR: &str = "curator";
pub const SUBMITTER: &str = "submitter";

/// Domain service deciding which automatic badges a user has earned.
pub struct BadgeService;

impl BadgeService {
    /// Badges earned by karma, account age and activity, in award order.
    pub fn eligible_badges(karma: i32, account_age_days: i64, stats: &UserStats) -> Vec<&'static str> {
        let rules = [
            (karma >= 10_000, INFLUENCER),
            (karma >= 1_000, TRUSTED_USER),
            (account_age_days >= 365, VETERAN),
            (stats.total_comments >= 100, CONVERSATIONALIST),
            (stats.total_votes_cast >= 1_000, CURATOR),
            (stats.total_clips_submitted >= 50, SUBMITTER),
        ];

        rules
            .into_iter()
            .filter_map(|(earned, badge)| earned.then_some(badge))
            .collect()
    }
}
