//! Trust score calculation domain service.

use crate::domain::entities::{TrustScoreBreakdown, TrustScoreInputs, MAX_TRUST_SCORE};

/// Maximum contribution of each component.
pub const MAX_ACCOUNT_AGE_SCORE: i64 = 20;
pub const MAX_KARMA_SCORE: i64 = 40;
pub const MAX_REPORT_ACCURACY: i64 = 20;
pub const MAX_ACTIVITY_SCORE: i64 = 20;

/// Domain service computing trust scores from raw counters.
///
/// All arithmetic is integer division so the result matches the
/// `calculate_trust_score` database function exactly.
pub struct TrustScoreService;

impl TrustScoreService {
    /// One point per 18 days of account age.
    pub fn account_age_score(days: i64) -> i64 {
        (days / 18).min(MAX_ACCOUNT_AGE_SCORE)
    }

    /// One point per 250 karma.
    pub fn karma_score(karma: i64) -> i64 {
        (karma / 250).min(MAX_KARMA_SCORE)
    }

    /// Share of correct reports scaled to 20. Zero when nothing was reported.
    pub fn report_accuracy(correct: i64, incorrect: i64) -> i64 {
        let total = correct + incorrect;
        if total > 0 {
            (MAX_REPORT_ACCURACY * correct) / total
        } else {
            0
        }
    }

    pub fn activity_score(comments: i64, votes: i64, days_active: i64) -> i64 {
        (comments / 10 + votes / 100 + days_active / 5).min(MAX_ACTIVITY_SCORE)
    }

    /// Full breakdown. Banned users keep half their score.
    pub fn breakdown(inputs: TrustScoreInputs) -> TrustScoreBreakdown {
        let account_age_score = Self::account_age_score(inputs.account_age_days);
        let karma_score = Self::karma_score(inputs.karma_points);
        let report_accuracy = Self::report_accuracy(inputs.correct_reports, inputs.incorrect_reports);
        let activity_score =
            Self::activity_score(inputs.total_comments, inputs.total_votes, inputs.days_active);

        let mut total_score = account_age_score + karma_score + report_accuracy + activity_score;
        let mut ban_penalty = 0.0;
        if inputs.is_banned {
            ban_penalty = 0.5;
            total_score /= 2;
        }

        TrustScoreBreakdown {
            total_score: total_score.clamp(0, MAX_TRUST_SCORE),
            account_age_score,
            karma_score,
            report_accuracy,
            activity_score,
            max_score: MAX_TRUST_SCORE,
            ban_penalty,
            inputs,
        }
    }
}
