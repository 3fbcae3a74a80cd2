//! DMCA workflow tests

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use clip_repository::domain::{
    CounterNoticeStatus, DmcaCounterNotice, DmcaNotice, DmcaRepository, DmcaStrike, NoticeStatus,
    StatusFilter, StrikeStatus,
};
use clip_repository::infrastructure::repositories::PgDmcaRepository;

use crate::common::{insert_user, test_pool};

fn notice() -> DmcaNotice {
    let now = Utc::now();
    DmcaNotice {
        id: Uuid::new_v4(),
        complainant_name: "Rights Holder LLC".to_string(),
        complainant_email: "legal@example.com".to_string(),
        complainant_address: "1 Main St".to_string(),
        complainant_phone: None,
        relationship: "owner".to_string(),
        copyrighted_work_description: "Broadcast footage".to_string(),
        infringing_urls: vec!["https://clips.example.com/c/1".to_string()],
        good_faith_statement: true,
        accuracy_statement: true,
        signature: "R. Holder".to_string(),
        submitted_at: now,
        reviewed_at: None,
        reviewed_by: None,
        status: NoticeStatus::Pending,
        notes: None,
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: None,
        created_at: now,
        updated_at: now,
    }
}

fn counter_notice(notice_id: Uuid, user_id: Uuid) -> DmcaCounterNotice {
    let now = Utc::now();
    DmcaCounterNotice {
        id: Uuid::new_v4(),
        dmca_notice_id: notice_id,
        user_id: Some(user_id),
        user_name: "Uploader".to_string(),
        user_email: "uploader@example.com".to_string(),
        user_address: "2 Side St".to_string(),
        user_phone: None,
        removed_material_url: "https://clips.example.com/c/1".to_string(),
        removed_material_description: None,
        good_faith_statement: true,
        consent_to_jurisdiction: true,
        consent_to_service: true,
        signature: "U. Ploader".to_string(),
        submitted_at: now,
        forwarded_at: None,
        waiting_period_ends: None,
        status: CounterNoticeStatus::Pending,
        lawsuit_filed: false,
        lawsuit_filed_at: None,
        notes: None,
        ip_address: None,
        user_agent: None,
        created_at: now,
        updated_at: now,
    }
}

/// Store a pending notice and return its id.
pub async fn create_test_notice(repo: &dyn DmcaRepository) -> Uuid {
    repo.create_notice(&notice()).await.unwrap().id
}

#[tokio::test]
async fn test_notice_roundtrip_and_review() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let reviewer = insert_user(&pool, 0, 1).await;

    let created = repo.create_notice(&notice()).await.unwrap();
    assert_eq!(created.ip_address.as_deref(), Some("203.0.113.7"));

    repo.update_notice_status(created.id, NoticeStatus::Valid, reviewer, Some("checked"))
        .await
        .unwrap();

    let fetched = repo.get_notice(created.id).await.unwrap();
    assert_eq!(fetched.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(fetched.status, NoticeStatus::Valid);
    assert_eq!(fetched.reviewed_by, Some(reviewer));
    assert!(fetched.reviewed_at.is_some());

    let valid = repo
        .list_notices(StatusFilter::Only(NoticeStatus::Valid), 1, 100)
        .await
        .unwrap();
    assert!(valid.items.iter().all(|n| n.status == NoticeStatus::Valid));
    assert!(valid.total >= 1);
}

#[tokio::test]
async fn test_missing_notice_is_not_found() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool);

    let err = repo.get_notice(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = repo
        .update_notice_status(Uuid::new_v4(), NoticeStatus::Invalid, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_counter_notice_awaiting_restore() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let notice = repo.create_notice(&notice()).await.unwrap();

    let elapsed = repo
        .create_counter_notice(&counter_notice(notice.id, user_id))
        .await
        .unwrap();
    let pending = repo
        .create_counter_notice(&counter_notice(notice.id, user_id))
        .await
        .unwrap();

    repo.mark_counter_notice_forwarded(elapsed.id, Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    repo.mark_counter_notice_forwarded(pending.id, Utc::now() + Duration::days(10))
        .await
        .unwrap();

    let forwarded = repo.get_counter_notice(elapsed.id).await.unwrap();
    assert_eq!(forwarded.status, CounterNoticeStatus::Forwarded);
    assert!(forwarded.forwarded_at.is_some());

    for id in [elapsed.id, pending.id] {
        repo.update_counter_notice_status(id, CounterNoticeStatus::Waiting, None)
            .await
            .unwrap();
    }

    let awaiting: Vec<_> = repo
        .counter_notices_awaiting_restore()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();

    assert!(awaiting.contains(&elapsed.id));
    assert!(!awaiting.contains(&pending.id));
}

#[tokio::test]
async fn test_counter_notice_created_with_elapsed_waiting_period() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let notice = repo.create_notice(&notice()).await.unwrap();

    let forwarded_at = Utc::now() - Duration::days(15);
    let mut waiting = counter_notice(notice.id, user_id);
    waiting.status = CounterNoticeStatus::Waiting;
    waiting.forwarded_at = Some(forwarded_at);
    waiting.waiting_period_ends = Some(Utc::now() - Duration::days(1));
    waiting.notes = Some("forwarded by mail".to_string());

    let created = repo.create_counter_notice(&waiting).await.unwrap();
    assert!(created.waiting_period_ends.is_some());
    assert!(created.forwarded_at.is_some());
    assert_eq!(created.notes.as_deref(), Some("forwarded by mail"));

    let mut lawsuit = waiting.clone();
    lawsuit.id = Uuid::new_v4();
    lawsuit.lawsuit_filed = true;
    lawsuit.lawsuit_filed_at = Some(Utc::now() - Duration::days(2));
    let lawsuit = repo.create_counter_notice(&lawsuit).await.unwrap();
    assert!(lawsuit.lawsuit_filed_at.is_some());

    let awaiting: Vec<_> = repo
        .counter_notices_awaiting_restore()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();

    assert!(awaiting.contains(&created.id));
    assert!(!awaiting.contains(&lawsuit.id));
}

#[tokio::test]
async fn test_counter_notice_ip_address_roundtrip() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let notice = repo.create_notice(&notice()).await.unwrap();

    let mut counter = counter_notice(notice.id, user_id);
    counter.ip_address = Some("2001:db8::1".to_string());
    let created = repo.create_counter_notice(&counter).await.unwrap();

    assert_eq!(created.ip_address.as_deref(), Some("2001:db8::1"));
    let fetched = repo.get_counter_notice(created.id).await.unwrap();
    assert_eq!(fetched.ip_address.as_deref(), Some("2001:db8::1"));
}

#[tokio::test]
async fn test_expire_old_strikes() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let user_id = insert_user(&pool, 0, 1).await;
    let notice = repo.create_notice(&notice()).await.unwrap();

    let mut stale = DmcaStrike::new(user_id, notice.id, 1);
    stale.expires_at = Utc::now() - Duration::days(1);
    let stale = repo.create_strike(&stale).await.unwrap();
    let fresh = repo
        .create_strike(&DmcaStrike::new(user_id, notice.id, 2))
        .await
        .unwrap();

    repo.expire_old_strikes().await.unwrap();

    let active = repo.active_strikes(user_id).await.unwrap();
    assert_eq!(active.iter().map(|s| s.id).collect::<Vec<_>>(), vec![fresh.id]);

    let all = repo.all_strikes(user_id).await.unwrap();
    let expired = all.iter().find(|s| s.id == stale.id).unwrap();
    assert_eq!(expired.status, StrikeStatus::Expired);
    assert_eq!(expired.removal_reason.as_deref(), Some("expired"));
    assert_eq!(expired.removed_at, None);
}

#[tokio::test]
async fn test_users_with_strikes_counts_active_only() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgDmcaRepository::new(pool.clone());
    let repeat = insert_user(&pool, 0, 1).await;
    let once = insert_user(&pool, 0, 1).await;
    let notice = repo.create_notice(&notice()).await.unwrap();

    for n in 1..=3 {
        repo.create_strike(&DmcaStrike::new(repeat, notice.id, n)).await.unwrap();
    }
    let removed = repo
        .create_strike(&DmcaStrike::new(once, notice.id, 1))
        .await
        .unwrap();
    repo.create_strike(&DmcaStrike::new(once, notice.id, 2)).await.unwrap();
    repo.remove_strike(removed.id, "appeal granted").await.unwrap();

    let flagged = repo.users_with_strikes(2).await.unwrap();
    assert!(flagged.contains(&repeat));
    assert!(!flagged.contains(&once));
}
