//! Clip mirror tests

use chrono::Duration;
use pretty_assertions::assert_eq;

use clip_repository::domain::{ClipMirror, MirrorRepository, MirrorStatus};
use clip_repository::infrastructure::repositories::PgMirrorRepository;

use crate::common::{insert_clip, test_pool};

#[tokio::test]
async fn test_one_mirror_per_clip_and_region() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgMirrorRepository::new(pool.clone());
    let clip_id = insert_clip(&pool).await;

    let mirror = ClipMirror::new(clip_id, "eu-west", "https://eu.cdn.example.com/a.mp4", "s3");
    repo.create(&mirror).await.unwrap();

    let duplicate = ClipMirror::new(clip_id, "eu-west", "https://eu.cdn.example.com/b.mp4", "s3");
    let err = repo.create(&duplicate).await.unwrap_err();
    assert!(err.is_conflict());

    let found = repo.get_by_clip_and_region(clip_id, "eu-west").await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(mirror.id));
    assert!(repo.get_by_clip_and_region(clip_id, "ap-south").await.unwrap().is_none());
}

#[tokio::test]
async fn test_status_and_access_tracking() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgMirrorRepository::new(pool.clone());
    let clip_id = insert_clip(&pool).await;

    let mirror = repo
        .create(&ClipMirror::new(clip_id, "us-east", "https://us.cdn.example.com/a.mp4", "s3"))
        .await
        .unwrap();

    repo.update_status(mirror.id, MirrorStatus::Active, None).await.unwrap();
    repo.record_access(mirror.id).await.unwrap();
    repo.record_access(mirror.id).await.unwrap();

    let stored = repo.get_by_id(mirror.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MirrorStatus::Active);
    assert_eq!(stored.access_count, 2);
    assert!(stored.last_accessed_at.is_some());

    let err = repo
        .update_status(uuid::Uuid::new_v4(), MirrorStatus::Failed, Some("timeout"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_expired_keeps_live_mirrors() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgMirrorRepository::new(pool.clone());
    let clip_id = insert_clip(&pool).await;

    let expired = repo
        .create(
            &ClipMirror::new(clip_id, "eu-central", "https://eu.cdn.example.com/x.mp4", "s3")
                .with_ttl(Duration::hours(-1)),
        )
        .await
        .unwrap();
    let live = repo
        .create(
            &ClipMirror::new(clip_id, "us-west", "https://us.cdn.example.com/x.mp4", "s3")
                .with_ttl(Duration::days(7)),
        )
        .await
        .unwrap();

    repo.delete_expired().await.unwrap();

    assert!(repo.get_by_id(expired.id).await.unwrap().is_none());
    assert!(repo.get_by_id(live.id).await.unwrap().is_some());
}
