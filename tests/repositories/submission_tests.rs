//! Clip submission tests

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use clip_repository::domain::{ClipSubmission, SubmissionRepository, SubmissionStatus};
use clip_repository::infrastructure::repositories::PgSubmissionRepository;

use crate::common::{insert_user, test_pool, unique};

fn submission(user_id: uuid::Uuid) -> ClipSubmission {
    let twitch_clip_id = unique("submitted");
    let mut submission = ClipSubmission::new(
        user_id,
        twitch_clip_id.clone(),
        format!("https://clips.twitch.tv/{}", twitch_clip_id),
    );
    submission.title = Some("Insane clutch".to_string());
    submission.tags = vec!["clutch".to_string(), "fps".to_string()];
    submission.broadcaster_name = Some("streamer".to_string());
    submission.duration = Some(28.5);
    submission
}

#[tokio::test]
async fn test_create_and_fetch() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    let created = repo.create(&submission(user_id)).await.unwrap();
    let fetched = repo.get_by_id(created.id).await.unwrap();

    assert_eq!(fetched.tags, vec!["clutch".to_string(), "fps".to_string()]);
    assert_eq!(fetched.duration, Some(28.5));
    assert!(fetched.is_pending());

    let by_clip = repo
        .find_by_twitch_clip_id(&created.twitch_clip_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_clip.id, created.id);
}

#[tokio::test]
async fn test_unknown_submission_is_not_found() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool);

    let err = repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    let missing = repo.find_by_twitch_clip_id(&unique("nothing")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_review_leaves_pending_queue() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;

    let created = repo.create(&submission(user_id)).await.unwrap();
    repo.update_status(created.id, SubmissionStatus::Rejected, moderator, Some("Duplicate"))
        .await
        .unwrap();

    let reviewed = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(reviewed.status, SubmissionStatus::Rejected);
    assert_eq!(reviewed.reviewed_by, Some(moderator));
    assert_eq!(reviewed.rejection_reason.as_deref(), Some("Duplicate"));
    assert!(reviewed.reviewed_at.is_some());

    let pending = repo.list_pending(1, 100).await.unwrap();
    assert!(pending.items.iter().all(|s| s.submission.id != created.id));
}

#[tokio::test]
async fn test_update_status_of_unknown_submission() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let moderator = insert_user(&pool, 0, 1).await;

    let err = repo
        .update_status(uuid::Uuid::new_v4(), SubmissionStatus::Approved, moderator, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_by_user_pages() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let other = insert_user(&pool, 0, 1).await;

    for _ in 0..3 {
        repo.create(&submission(user_id)).await.unwrap();
    }
    repo.create(&submission(other)).await.unwrap();

    let first = repo.list_by_user(user_id, 1, 2).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more());

    let second = repo.list_by_user(user_id, 2, 2).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(second.items.iter().all(|s| s.user_id == user_id));
}

#[tokio::test]
async fn test_count_and_stats() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;

    let mut old = submission(user_id);
    old.created_at = Utc::now() - Duration::days(3);
    let old = repo.create(&old).await.unwrap();
    let approved = repo.create(&submission(user_id)).await.unwrap();
    repo.create(&submission(user_id)).await.unwrap();

    repo.update_status(old.id, SubmissionStatus::Rejected, moderator, None)
        .await
        .unwrap();
    repo.update_status(approved.id, SubmissionStatus::Approved, moderator, None)
        .await
        .unwrap();

    let recent = repo
        .count_user_submissions(user_id, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(recent, 2);

    let stats = repo.user_stats(user_id).await.unwrap();
    assert_eq!(stats.total_submissions, 3);
    assert_eq!(stats.approved_count, 1);
    assert_eq!(stats.rejected_count, 1);
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.approval_rate, 0.5);
}

#[tokio::test]
async fn test_stats_for_user_without_submissions() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgSubmissionRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    let stats = repo.user_stats(user_id).await.unwrap();
    assert_eq!(stats.total_submissions, 0);
    assert_eq!(stats.approval_rate, 0.0);
}
