//! Maintenance pass tests

use chrono::{Duration, Utc};

use clip_repository::config::{
    DatabaseSettings, ListingSettings, MirrorSettings, Settings,
};
use clip_repository::domain::{ClipMirror, DmcaStrike, StrikeStatus};
use clip_repository::startup::Application;

use crate::common::{insert_clip, insert_user, test_pool};

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: 30,
        },
        listing: ListingSettings {
            default_limit: 25,
            max_limit: 100,
        },
        mirror: MirrorSettings {
            max_active_per_clip: 3,
            popularity_threshold: 1000,
        },
        environment: "test".to_string(),
    }
}

#[tokio::test]
async fn test_maintenance_sweeps_and_reports_metrics() {
    let Some(pool) = test_pool().await else { return };
    let app = Application::with_pool(pool.clone(), test_settings());
    let repos = app.repositories();

    let user_id = insert_user(&pool, 0, 1).await;
    let notice_id = crate::repositories::dmca_tests::create_test_notice(&*repos.dmca).await;
    let mut stale = DmcaStrike::new(user_id, notice_id, 1);
    stale.expires_at = Utc::now() - Duration::days(1);
    let stale = repos.dmca.create_strike(&stale).await.unwrap();

    let clip_id = insert_clip(&pool).await;
    let expired_mirror = repos
        .mirrors
        .create(
            &ClipMirror::new(clip_id, "sa-east", "https://sa.cdn.example.com/m.mp4", "s3")
                .with_ttl(Duration::hours(-2)),
        )
        .await
        .unwrap();

    // Other tests sweep the same tables, so check end state rather than counts
    app.run_maintenance().await.unwrap();

    let strikes = repos.dmca.all_strikes(user_id).await.unwrap();
    assert_eq!(strikes[0].id, stale.id);
    assert_eq!(strikes[0].status, StrikeStatus::Expired);
    assert!(repos.mirrors.get_by_id(expired_mirror.id).await.unwrap().is_none());

    let snapshot = app.metrics_snapshot();
    assert!(snapshot.contains("maintenance_rows_total"));
    assert!(snapshot.contains("task=\"strikes_expired\""));
    assert!(snapshot.contains("db_pool_connections"));
}
