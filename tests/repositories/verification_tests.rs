//! Creator verification tests

use std::collections::HashMap;

use chrono::Utc;
use pretty_assertions::assert_eq;

use clip_repository::domain::{
    CreatorVerification, IdentityDocumentType, VerificationAuditLog, VerificationRepository,
    VerificationStatus,
};
use clip_repository::infrastructure::repositories::PgVerificationRepository;

use crate::common::{insert_user, test_pool};

fn application(user_id: uuid::Uuid) -> CreatorVerification {
    let mut verification = CreatorVerification::new(user_id);
    verification.application_reason = Some("Full-time streamer".to_string());
    verification.identity_document_type = Some(IdentityDocumentType::Passport);
    verification.follower_count = Some(12_000);
    verification.platform_username = Some("streamer".to_string());
    verification
}

#[tokio::test]
async fn test_second_pending_application_conflicts() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgVerificationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    repo.create(&application(user_id)).await.unwrap();
    let err = repo.create(&application(user_id)).await.unwrap_err();

    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_reapply_after_rejection() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgVerificationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;

    let mut first = repo.create(&application(user_id)).await.unwrap();
    first.status = VerificationStatus::Rejected;
    first.reviewed_by = Some(moderator);
    first.reviewed_at = Some(Utc::now());
    first.rejection_reason = Some("Not enough followers".to_string());
    let rejected = repo.update(&first).await.unwrap();
    assert_eq!(rejected.status, VerificationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Not enough followers"));

    let second = repo.create(&application(user_id)).await.unwrap();
    let latest = repo.latest_for_user(user_id).await.unwrap();

    assert_eq!(latest.id, second.id);
    assert_eq!(latest.identity_document_type, Some(IdentityDocumentType::Passport));
    assert_eq!(latest.follower_count, Some(12_000));
}

#[tokio::test]
async fn test_unknown_verification_is_not_found() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgVerificationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    assert!(repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap_err().is_not_found());
    assert!(repo.latest_for_user(user_id).await.unwrap_err().is_not_found());

    let err = repo.update(&CreatorVerification::new(user_id)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_joins_applicant() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgVerificationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;

    let created = repo.create(&application(user_id)).await.unwrap();
    let mut approved = created.clone();
    approved.status = VerificationStatus::Approved;
    approved.identity_verified = true;
    repo.update(&approved).await.unwrap();

    let page = repo
        .list(Some(VerificationStatus::Approved), 100, 0)
        .await
        .unwrap();

    assert!(page.total >= 1);
    assert!(page.items.iter().all(|v| v.verification.status == VerificationStatus::Approved));
    if let Some(entry) = page.items.iter().find(|v| v.verification.id == created.id) {
        assert_eq!(entry.user.id, user_id);
        assert!(entry.verification.identity_verified);
    }
}

#[tokio::test]
async fn test_audit_log_newest_first() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgVerificationRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;

    let verification = repo.create(&application(user_id)).await.unwrap();

    let submitted = VerificationAuditLog::new(verification.id, "submitted", Some(user_id));
    repo.create_audit_log(&submitted).await.unwrap();

    let mut reviewed = VerificationAuditLog::new(verification.id, "approved", Some(moderator))
        .with_transition(VerificationStatus::Pending, VerificationStatus::Approved);
    reviewed.created_at = submitted.created_at + chrono::Duration::seconds(1);
    reviewed.metadata = Some(HashMap::from([(
        "follower_count".to_string(),
        serde_json::json!(12_000),
    )]));
    repo.create_audit_log(&reviewed).await.unwrap();

    let logs = repo.list_audit_logs(verification.id, 10).await.unwrap();

    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "approved");
    assert_eq!(logs[0].previous_status, Some(VerificationStatus::Pending));
    assert_eq!(logs[0].new_status, Some(VerificationStatus::Approved));
    assert_eq!(logs[0].metadata.as_ref().unwrap()["follower_count"], serde_json::json!(12_000));
    assert_eq!(logs[1].new_status, None);
}
