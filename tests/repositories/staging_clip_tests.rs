//! Staged clip and claim workflow tests

use std::sync::Arc;

use pretty_assertions::assert_eq;

use clip_repository::domain::{ClaimRequest, StagingClipFilter, StagingClipRepository, StagingClipSort};
use clip_repository::infrastructure::repositories::PgStagingClipRepository;

use crate::common::{insert_user, staging_clip, test_pool};

#[tokio::test]
async fn test_claim_moves_clip_and_applies_overrides() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgStagingClipRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 30).await;

    let staged = repo.create(&staging_clip()).await.unwrap();

    let mut request = ClaimRequest::new(&staged.twitch_clip_id, user_id);
    request.custom_title = Some("Better title".to_string());
    request.broadcaster_name_override = Some(String::new());

    let published = repo.claim(&request).await.unwrap();

    assert_eq!(published.id, staged.id);
    assert_eq!(published.title, "Better title");
    assert_eq!(published.broadcaster_name, staged.broadcaster_name);
    assert_eq!(published.submitted_by_user_id, Some(user_id));
    assert_eq!(published.vote_score, 0);

    assert!(!repo.exists_by_twitch_clip_id(&staged.twitch_clip_id).await.unwrap());
    let found = repo
        .find_published_by_twitch_clip_id(&staged.twitch_clip_id)
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(staged.id));
}

#[tokio::test]
async fn test_second_claim_is_conflict() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgStagingClipRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 30).await;

    let staged = repo.create(&staging_clip()).await.unwrap();
    let request = ClaimRequest::new(&staged.twitch_clip_id, user_id);

    repo.claim(&request).await.unwrap();
    let err = repo.claim(&request).await.unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_concurrent_claims_have_one_winner() {
    let Some(pool) = test_pool().await else { return };
    let repo = Arc::new(PgStagingClipRepository::new(pool.clone()));
    let user_id = insert_user(&pool, 0, 30).await;

    let staged = repo.create(&staging_clip()).await.unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let request = ClaimRequest::new(&staged.twitch_clip_id, user_id);
            tokio::spawn(async move { repo.claim(&request).await })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(err) => assert!(err.is_conflict(), "unexpected error: {err}"),
        }
    }

    assert_eq!(wins, 1);
}

#[tokio::test]
async fn test_create_refuses_published_id() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgStagingClipRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 30).await;

    let clip = staging_clip();
    repo.create(&clip).await.unwrap();
    repo.claim(&ClaimRequest::new(&clip.twitch_clip_id, user_id))
        .await
        .unwrap();

    let mut again = clip.clone();
    again.id = uuid::Uuid::new_v4();
    let err = repo.create(&again).await.unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_list_total_covers_filtered_set() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgStagingClipRepository::new(pool);

    let broadcaster_id = crate::common::unique("b");
    for views in [5, 50, 500] {
        let mut clip = staging_clip();
        clip.broadcaster_id = Some(broadcaster_id.clone());
        clip.view_count = views;
        repo.create(&clip).await.unwrap();
    }

    let filter = StagingClipFilter {
        broadcaster_id: Some(broadcaster_id),
        ..Default::default()
    };

    let page = repo
        .list(&filter, StagingClipSort::from_str("views"), 2, 0)
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].view_count, 500);
    assert_eq!(page.items[1].view_count, 50);
}
