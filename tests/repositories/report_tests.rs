//! Report tests

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use clip_repository::domain::{Report, ReportRepository, ReportStatus, ReportableType};
use clip_repository::infrastructure::repositories::PgReportRepository;

use crate::common::{insert_clip, insert_user, test_pool};

#[tokio::test]
async fn test_open_report_blocks_duplicate_until_dismissed() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReportRepository::new(pool.clone());
    let reporter = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;
    let clip_id = insert_clip(&pool).await;

    let report = repo
        .create(&Report::new(reporter, ReportableType::Clip, clip_id, "spam"))
        .await
        .unwrap();

    assert!(repo
        .has_open_duplicate(reporter, ReportableType::Clip, clip_id)
        .await
        .unwrap());
    // Same id, different kind of target.
    assert!(!repo
        .has_open_duplicate(reporter, ReportableType::Comment, clip_id)
        .await
        .unwrap());

    repo.update_status(report.id, ReportStatus::Reviewed, moderator)
        .await
        .unwrap();
    assert!(repo
        .has_open_duplicate(reporter, ReportableType::Clip, clip_id)
        .await
        .unwrap());

    repo.update_status(report.id, ReportStatus::Dismissed, moderator)
        .await
        .unwrap();
    assert!(!repo
        .has_open_duplicate(reporter, ReportableType::Clip, clip_id)
        .await
        .unwrap());

    let stored = repo.find_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::Dismissed);
    assert_eq!(stored.reviewed_by, Some(moderator));
}

#[tokio::test]
async fn test_update_status_of_unknown_report() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReportRepository::new(pool.clone());
    let moderator = insert_user(&pool, 0, 1).await;

    let err = repo
        .update_status(uuid::Uuid::new_v4(), ReportStatus::Actioned, moderator)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.find_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_count_by_reporter_window() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReportRepository::new(pool.clone());
    let reporter = insert_user(&pool, 0, 1).await;
    let target = insert_user(&pool, 0, 1).await;

    let mut old = Report::new(reporter, ReportableType::User, target, "harassment");
    old.created_at = Utc::now() - Duration::days(2);
    repo.create(&old).await.unwrap();
    repo.create(&Report::new(reporter, ReportableType::User, target, "spam"))
        .await
        .unwrap();

    let last_day = repo
        .count_by_reporter(reporter, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(last_day, 1);

    let for_target = repo
        .list_for_reportable(ReportableType::User, target)
        .await
        .unwrap();
    assert_eq!(for_target.len(), 2);
    assert_eq!(for_target[0].reason, "spam");
}

#[tokio::test]
async fn test_list_filters_by_status_and_type() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgReportRepository::new(pool.clone());
    let reporter = insert_user(&pool, 0, 1).await;
    let moderator = insert_user(&pool, 0, 1).await;
    let clip_id = insert_clip(&pool).await;

    let actioned = repo
        .create(&Report::new(reporter, ReportableType::Clip, clip_id, "copyright"))
        .await
        .unwrap();
    repo.update_status(actioned.id, ReportStatus::Actioned, moderator)
        .await
        .unwrap();

    let page = repo
        .list(Some(ReportStatus::Actioned), Some(ReportableType::Clip), 1, 100)
        .await
        .unwrap();

    assert!(page.total >= 1);
    assert!(page
        .items
        .iter()
        .all(|r| r.status == ReportStatus::Actioned && r.reportable_type == ReportableType::Clip));
}
