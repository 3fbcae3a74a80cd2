//! Reputation tests

use pretty_assertions::assert_eq;

use clip_repository::domain::{
    ActivityKind, ReputationRepository, TrustScoreUpdate, UserStats,
};
use clip_repository::infrastructure::repositories::PgReputationRepository;

use crate::common::{insert_user, test_pool};

#[tokio::test]
async fn test_trust_breakdown_from_stored_counters() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 3000, 100).await;

    let mut stats = UserStats::new(user_id);
    stats.correct_reports = 3;
    stats.incorrect_reports = 1;
    stats.total_comments = 40;
    stats.total_votes_cast = 500;
    stats.days_active = 20;
    repo.upsert_user_stats(&stats).await.unwrap();

    let breakdown = repo.trust_score_breakdown(user_id).await.unwrap();

    assert_eq!(breakdown.account_age_score, 5);
    assert_eq!(breakdown.karma_score, 12);
    assert_eq!(breakdown.report_accuracy, 15);
    assert_eq!(breakdown.activity_score, 13);
    assert_eq!(breakdown.total_score, 45);
    assert_eq!(breakdown.ban_penalty, 0.0);
}

#[tokio::test]
async fn test_trust_breakdown_without_stats_row() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 0).await;

    let breakdown = repo.trust_score_breakdown(user_id).await.unwrap();

    assert_eq!(breakdown.total_score, 0);
    assert_eq!(breakdown.report_accuracy, 0);
}

#[tokio::test]
async fn test_trust_breakdown_unknown_user() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool);

    let err = repo
        .trust_score_breakdown(uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_increment_activity_creates_stats() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    repo.increment_activity(user_id, ActivityKind::Comment, 2).await.unwrap();
    repo.increment_activity(user_id, ActivityKind::Vote, 5).await.unwrap();

    let stats = repo.user_stats(user_id).await.unwrap().unwrap();
    assert_eq!(stats.total_comments, 2);
    assert_eq!(stats.total_votes_cast, 5);
    assert_eq!(stats.total_clips_submitted, 0);
}

#[tokio::test]
async fn test_badges_are_awarded_once() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 12_000, 400).await;

    let first = repo.check_and_award_badges(user_id).await.unwrap();
    assert_eq!(first, vec!["influencer", "trusted_user", "veteran"]);

    let second = repo.check_and_award_badges(user_id).await.unwrap();
    assert!(second.is_empty());

    let held = repo.badges(user_id).await.unwrap();
    assert_eq!(held.len(), first.len());
}

#[tokio::test]
async fn test_stored_trust_score_matches_breakdown() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 3000, 100).await;

    let mut stats = UserStats::new(user_id);
    stats.correct_reports = 3;
    stats.incorrect_reports = 1;
    stats.total_comments = 40;
    stats.total_votes_cast = 500;
    stats.days_active = 20;
    repo.upsert_user_stats(&stats).await.unwrap();

    let score = repo.trust_score(user_id).await.unwrap();
    let breakdown = repo.trust_score_breakdown(user_id).await.unwrap();

    assert_eq!(i64::from(score), breakdown.total_score);
    assert_eq!(score, 45);
}

#[tokio::test]
async fn test_engagement_score_without_activity_is_zero() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    assert_eq!(repo.engagement_score(user_id).await.unwrap(), 0);

    repo.increment_activity(user_id, ActivityKind::Comment, 3).await.unwrap();
    assert!(repo.engagement_score(user_id).await.unwrap() > 0);
}

#[tokio::test]
async fn test_trust_score_updates_are_logged() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 3000, 100).await;
    let moderator = insert_user(&pool, 0, 1).await;

    let breakdown = repo.trust_score_breakdown(user_id).await.unwrap();
    repo.update_trust_score(user_id, &TrustScoreUpdate::from_breakdown(&breakdown, "recalculated"))
        .await
        .unwrap();

    let manual = TrustScoreUpdate {
        new_score: 80,
        reason: "manual_adjustment".to_string(),
        component_scores: None,
        changed_by: Some(moderator),
        notes: Some("Long-standing contributor".to_string()),
    };
    repo.update_trust_score(user_id, &manual).await.unwrap();

    let stats = repo.user_stats(user_id).await.unwrap().unwrap();
    assert_eq!(stats.trust_score, 80);

    let history = repo.trust_score_history(user_id, 10).await.unwrap();
    assert_eq!(history.len(), 2);

    let latest = history.iter().find(|h| h.change_reason == "manual_adjustment").unwrap();
    assert_eq!(latest.old_score, Some(breakdown.total_score as i32));
    assert_eq!(latest.new_score, 80);
    assert_eq!(latest.changed_by, Some(moderator));
    assert_eq!(latest.notes.as_deref(), Some("Long-standing contributor"));

    let first = history.iter().find(|h| h.change_reason == "recalculated").unwrap();
    assert_eq!(first.old_score, None);
    let components = first.component_scores.as_ref().unwrap();
    assert_eq!(components["karma"], serde_json::json!(breakdown.karma_score));
}

#[tokio::test]
async fn test_trust_score_history_respects_limit() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReputationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    for new_score in [10, 20, 30] {
        let update = TrustScoreUpdate {
            new_score,
            reason: "recalculated".to_string(),
            component_scores: None,
            changed_by: None,
            notes: None,
        };
        repo.update_trust_score(user_id, &update).await.unwrap();
    }

    let history = repo.trust_score_history(user_id, 2).await.unwrap();
    assert_eq!(history.len(), 2);
}
