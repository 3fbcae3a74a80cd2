//! Community membership and listing tests

use pretty_assertions::assert_eq;

use clip_repository::domain::{
    Community, CommunityBan, CommunityMember, CommunityRepository, CommunityRole,
};
use clip_repository::infrastructure::repositories::PgCommunityRepository;

use crate::common::{insert_user, test_pool, unique};

async fn create_community(repo: &PgCommunityRepository, name: &str, owner_id: uuid::Uuid) -> Community {
    repo.create(&Community::new(name, unique("slug"), owner_id))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_duplicate_slug_is_conflict() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCommunityRepository::new(pool.clone());
    let owner = insert_user(&pool, 0, 1).await;

    let first = create_community(&repo, "Speedrunners", owner).await;
    let err = repo
        .create(&Community::new("Copycats", first.slug.clone(), owner))
        .await
        .unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_member_count_follows_membership() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCommunityRepository::new(pool.clone());
    let owner = insert_user(&pool, 0, 1).await;
    let user = insert_user(&pool, 0, 1).await;
    let community = create_community(&repo, "Retro", owner).await;

    repo.add_member(&CommunityMember::new(community.id, user, CommunityRole::Member))
        .await
        .unwrap();
    let count = repo.find_by_id(community.id).await.unwrap().unwrap().member_count;
    assert_eq!(count, 1);

    repo.remove_member(community.id, user).await.unwrap();
    let count = repo.find_by_id(community.id).await.unwrap().unwrap().member_count;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_ban_removes_membership_and_blocks_rejoin() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCommunityRepository::new(pool.clone());
    let owner = insert_user(&pool, 0, 1).await;
    let user = insert_user(&pool, 0, 1).await;
    let community = create_community(&repo, "Fighting games", owner).await;

    repo.add_member(&CommunityMember::new(community.id, user, CommunityRole::Member))
        .await
        .unwrap();
    repo.ban_member(&CommunityBan::new(community.id, user, owner))
        .await
        .unwrap();

    assert!(!repo.is_member(community.id, user).await.unwrap());
    assert!(repo.is_banned(community.id, user).await.unwrap());

    let err = repo
        .add_member(&CommunityMember::new(community.id, user, CommunityRole::Member))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    repo.unban_member(community.id, user).await.unwrap();
    repo.add_member(&CommunityMember::new(community.id, user, CommunityRole::Member))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_search_orders_by_members_then_name() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCommunityRepository::new(pool.clone());
    let owner = insert_user(&pool, 0, 1).await;
    let tag = unique("tag");

    let beta = create_community(&repo, &format!("{} beta", tag), owner).await;
    create_community(&repo, &format!("{} alpha", tag), owner).await;
    create_community(&repo, &format!("{} gamma", tag), owner).await;

    repo.add_member(&CommunityMember::new(beta.id, owner, CommunityRole::Admin))
        .await
        .unwrap();

    let page = repo.search(&tag.to_uppercase(), 10, 0).await.unwrap();
    let names: Vec<_> = page.items.iter().map(|c| c.name.clone()).collect();

    assert_eq!(page.total, 3);
    assert_eq!(
        names,
        vec![
            format!("{} beta", tag),
            format!("{} alpha", tag),
            format!("{} gamma", tag),
        ]
    );
}
