//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure. Database tests run
//! against the Postgres named by `TEST_DATABASE_URL` and are skipped when it
//! is unset.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use fake::faker::internet::en::Username;
use fake::Fake;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use clip_repository::domain::StagingClip;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Connect to the test database, applying the fixture schema once per run.
///
/// Returns `None` when no database is configured.
pub async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect to test database");

    SCHEMA
        .get_or_init(|| async {
            sqlx::raw_sql(include_str!("../fixtures/schema.sql"))
                .execute(&pool)
                .await
                .expect("apply test schema");
        })
        .await;

    Some(pool)
}

/// A value no other test will generate.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Insert a user and return its id.
pub async fn insert_user(pool: &PgPool, karma_points: i32, age_days: i64) -> Uuid {
    let id = Uuid::new_v4();
    let name: String = Username().fake();

    sqlx::query(
        "INSERT INTO users (id, username, karma_points, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(format!("{}_{}", name, id.simple()))
    .bind(karma_points)
    .bind(Utc::now() - Duration::days(age_days))
    .execute(pool)
    .await
    .expect("insert user");

    id
}

/// A staged clip with a unique external id.
pub fn staging_clip() -> StagingClip {
    let twitch_clip_id = unique("clip");
    let now = Utc::now();

    StagingClip {
        id: Uuid::new_v4(),
        twitch_clip_url: format!("https://clips.twitch.tv/{}", twitch_clip_id),
        embed_url: format!("https://clips.twitch.tv/embed?clip={}", twitch_clip_id),
        twitch_clip_id,
        title: "Clutch play".to_string(),
        creator_name: "clipper".to_string(),
        creator_id: None,
        broadcaster_name: "streamer".to_string(),
        broadcaster_id: Some(unique("broadcaster")),
        game_id: None,
        game_name: None,
        language: Some("en".to_string()),
        thumbnail_url: None,
        duration: Some(30.0),
        view_count: 10,
        created_at: now,
        imported_at: now,
        is_nsfw: false,
        is_removed: false,
        is_hidden: false,
    }
}

/// Insert a published clip directly and return its id.
pub async fn insert_clip(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    let twitch_clip_id = unique("published");

    sqlx::query(
        r#"
        INSERT INTO clips (id, twitch_clip_id, twitch_clip_url, embed_url, title,
                           creator_name, broadcaster_name, created_at)
        VALUES ($1, $2, $3, $4, 'Published clip', 'clipper', 'streamer', NOW())
        "#,
    )
    .bind(id)
    .bind(&twitch_clip_id)
    .bind(format!("https://clips.twitch.tv/{}", twitch_clip_id))
    .bind(format!("https://clips.twitch.tv/embed?clip={}", twitch_clip_id))
    .execute(pool)
    .await
    .expect("insert clip");

    id
}
