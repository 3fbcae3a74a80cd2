//! Curation strategy tests
//!
//! Every test seeds clips under its own game id and filters on it, so rows
//! from concurrent tests never show up in the results.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use uuid::Uuid;

use clip_repository::domain::{CurationFilter, CurationRepository, Timeframe};
use clip_repository::infrastructure::repositories::PgCurationRepository;

use crate::common::{test_pool, unique};

#[derive(Clone)]
struct ClipSeed {
    game_id: String,
    creator_id: String,
    broadcaster_id: String,
    view_count: i32,
    vote_score: i32,
    comment_count: i32,
    favorite_count: i32,
    trending_score: f64,
    is_nsfw: bool,
    is_removed: bool,
    is_hidden: bool,
    age: Duration,
}

impl ClipSeed {
    fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            creator_id: unique("creator"),
            broadcaster_id: unique("broadcaster"),
            view_count: 0,
            vote_score: 0,
            comment_count: 0,
            favorite_count: 0,
            trending_score: 0.0,
            is_nsfw: false,
            is_removed: false,
            is_hidden: false,
            age: Duration::days(1),
        }
    }

    /// A clip every strategy without extra joins would accept.
    fn popular(game_id: &str) -> Self {
        Self {
            view_count: 100,
            favorite_count: 10,
            comment_count: 10,
            vote_score: 10,
            ..Self::new(game_id)
        }
    }

    async fn insert(&self, pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        let twitch_clip_id = unique("curated");

        sqlx::query(
            r#"
            INSERT INTO clips (id, twitch_clip_id, twitch_clip_url, embed_url, title,
                               creator_name, creator_id, broadcaster_name, broadcaster_id,
                               game_id, view_count, vote_score, comment_count, favorite_count,
                               trending_score, is_nsfw, is_removed, is_hidden, created_at)
            VALUES ($1, $2, $3, $4, 'Curated clip', 'clipper', $5, 'streamer', $6,
                    $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(id)
        .bind(&twitch_clip_id)
        .bind(format!("https://clips.twitch.tv/{}", twitch_clip_id))
        .bind(format!("https://clips.twitch.tv/embed?clip={}", twitch_clip_id))
        .bind(&self.creator_id)
        .bind(&self.broadcaster_id)
        .bind(&self.game_id)
        .bind(self.view_count)
        .bind(self.vote_score)
        .bind(self.comment_count)
        .bind(self.favorite_count)
        .bind(self.trending_score)
        .bind(self.is_nsfw)
        .bind(self.is_removed)
        .bind(self.is_hidden)
        .bind(Utc::now() - self.age)
        .execute(pool)
        .await
        .expect("insert curated clip");

        id
    }
}

fn for_game(game_id: &str) -> CurationFilter {
    CurationFilter {
        game_id: Some(game_id.to_string()),
        ..Default::default()
    }
}

async fn set_retention(pool: &PgPool, clip_id: Uuid, retention_rate: f64) {
    sqlx::query("INSERT INTO clip_analytics (clip_id, retention_rate) VALUES ($1, $2)")
        .bind(clip_id)
        .bind(retention_rate)
        .execute(pool)
        .await
        .expect("insert analytics");
}

async fn watch(pool: &PgPool, clip_id: Uuid, session_id: &str, progress_seconds: i32) {
    sqlx::query("INSERT INTO watch_history (clip_id, session_id, progress_seconds) VALUES ($1, $2, $3)")
        .bind(clip_id)
        .bind(session_id)
        .bind(progress_seconds)
        .execute(pool)
        .await
        .expect("insert watch history");
}

async fn tag(pool: &PgPool, clip_id: Uuid, slug: &str) {
    sqlx::query(
        "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $2) ON CONFLICT (slug) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(slug)
    .execute(pool)
    .await
    .expect("insert tag");

    sqlx::query("INSERT INTO clip_tags (clip_id, tag_id) SELECT $1, id FROM tags WHERE slug = $2")
        .bind(clip_id)
        .bind(slug)
        .execute(pool)
        .await
        .expect("tag clip");
}

async fn set_embedding(pool: &PgPool, clip_id: Uuid, embedding: &[f64]) {
    sqlx::query("SELECT set_clip_embedding($1, $2)")
        .bind(clip_id)
        .bind(embedding.to_vec())
        .execute(pool)
        .await
        .expect("set embedding");
}

#[tokio::test]
async fn test_sleeper_hits() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");

    let best = ClipSeed { view_count: 100, ..ClipSeed::new(&game) }.insert(&pool).await;
    let good = ClipSeed { view_count: 200, ..ClipSeed::new(&game) }.insert(&pool).await;
    let low_retention = ClipSeed { view_count: 100, ..ClipSeed::new(&game) }.insert(&pool).await;
    let too_popular = ClipSeed { view_count: 5000, ..ClipSeed::new(&game) }.insert(&pool).await;
    ClipSeed::new(&game).insert(&pool).await;

    set_retention(&pool, best, 0.9).await;
    set_retention(&pool, good, 0.7).await;
    set_retention(&pool, low_retention, 0.5).await;
    set_retention(&pool, too_popular, 0.95).await;

    let ids = repo.sleeper_hits(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![best, good]);
}

#[tokio::test]
async fn test_viral_velocity() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let fast = ClipSeed { view_count: 1000, age: Duration::hours(2), ..ClipSeed::new(&game) };

    let fastest = fast.insert(&pool).await;
    let slower = ClipSeed { age: Duration::hours(10), ..fast.clone() }.insert(&pool).await;
    ClipSeed { age: Duration::minutes(10), ..fast.clone() }.insert(&pool).await;
    ClipSeed { age: Duration::days(3), ..fast.clone() }.insert(&pool).await;

    let ids = repo.viral_velocity(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![fastest, slower]);
}

#[tokio::test]
async fn test_community_favorites() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed { view_count: 100, ..ClipSeed::new(&game) };

    let loved = ClipSeed { favorite_count: 50, ..base.clone() }.insert(&pool).await;
    let liked = ClipSeed { favorite_count: 10, ..base.clone() }.insert(&pool).await;
    ClipSeed { view_count: 5, favorite_count: 5, ..base.clone() }.insert(&pool).await;
    base.insert(&pool).await;

    let ids = repo.community_favorites(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![loved, liked]);
}

#[tokio::test]
async fn test_deep_cuts() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed { vote_score: 10, ..ClipSeed::new(&game) };

    let longest = base.insert(&pool).await;
    let long = base.insert(&pool).await;
    let short = base.insert(&pool).await;
    let trending = ClipSeed { trending_score: 10.0, ..base.clone() }.insert(&pool).await;

    for (clip_id, progress) in [(longest, 40), (longest, 50), (long, 20), (short, 10), (trending, 40)] {
        watch(&pool, clip_id, &unique("session"), progress).await;
    }

    let ids = repo.deep_cuts(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![longest, long]);
}

#[tokio::test]
async fn test_fresh_faces() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");

    let newcomer = ClipSeed { vote_score: 5, ..ClipSeed::new(&game) }.insert(&pool).await;
    let prolific = ClipSeed { vote_score: 50, ..ClipSeed::new(&game) };
    for _ in 0..6 {
        prolific.insert(&pool).await;
    }

    let ids = repo.fresh_faces(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![newcomer]);
}

#[tokio::test]
async fn test_similar_vibes() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed::new(&game);

    let seed = base.insert(&pool).await;
    let near = base.insert(&pool).await;
    let far = base.insert(&pool).await;
    base.insert(&pool).await;

    set_embedding(&pool, seed, &[1.0, 0.0, 0.0]).await;
    set_embedding(&pool, near, &[0.9, 0.1, 0.0]).await;
    set_embedding(&pool, far, &[0.0, 1.0, 0.0]).await;

    let ids = repo.similar_vibes(&for_game(&game), seed, 10).await.unwrap();
    assert_eq!(ids, vec![near, far]);
}

#[tokio::test]
async fn test_cross_game_hits() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let first_game = unique("game");
    let second_game = unique("game");

    let top = ClipSeed { vote_score: 30, ..ClipSeed::new(&second_game) }.insert(&pool).await;
    let next = ClipSeed { vote_score: 20, ..ClipSeed::new(&first_game) }.insert(&pool).await;
    ClipSeed { vote_score: 90, ..ClipSeed::new(&unique("game")) }.insert(&pool).await;

    let games = vec![first_game, second_game];
    let ids = repo
        .cross_game_hits(&CurationFilter::default(), &games, 10)
        .await
        .unwrap();
    assert_eq!(ids, vec![top, next]);

    let none = repo.cross_game_hits(&CurationFilter::default(), &[], 10).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_controversial() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed { view_count: 100, ..ClipSeed::new(&game) };

    let heated = ClipSeed { comment_count: 50, ..base.clone() }.insert(&pool).await;
    let lively = ClipSeed { comment_count: 10, ..base.clone() }.insert(&pool).await;
    ClipSeed { comment_count: 2, ..base.clone() }.insert(&pool).await;
    ClipSeed { comment_count: 50, view_count: 5, ..base.clone() }.insert(&pool).await;

    let ids = repo.controversial(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![heated, lively]);
}

#[tokio::test]
async fn test_binge_worthy() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");

    let mut binged = Vec::new();
    for views in [300, 100, 200] {
        binged.push(ClipSeed { view_count: views, ..ClipSeed::new(&game) }.insert(&pool).await);
    }
    let single = ClipSeed { view_count: 1000, ..ClipSeed::new(&game) }.insert(&pool).await;

    let session = unique("session");
    for &clip_id in &binged {
        watch(&pool, clip_id, &session, 30).await;
    }
    watch(&pool, single, &unique("session"), 30).await;

    let ids = repo.binge_worthy(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![binged[0], binged[2], binged[1]]);
}

#[tokio::test]
async fn test_rising_stars() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");

    let rising = ClipSeed::new(&game);
    for _ in 0..2 {
        ClipSeed { age: Duration::days(40), ..rising.clone() }.insert(&pool).await;
    }
    let breakout = ClipSeed { vote_score: 30, ..rising.clone() }.insert(&pool).await;

    let steady = ClipSeed { vote_score: 10, ..ClipSeed::new(&game) };
    for _ in 0..3 {
        steady.insert(&pool).await;
    }

    let ids = repo.rising_stars(&for_game(&game), 10).await.unwrap();
    assert_eq!(ids, vec![breakout]);
}

#[tokio::test]
async fn test_filter_excludes_removed_hidden_and_nsfw() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed::popular(&game);

    let visible = base.insert(&pool).await;
    let nsfw = ClipSeed { is_nsfw: true, ..base.clone() }.insert(&pool).await;
    ClipSeed { is_removed: true, ..base.clone() }.insert(&pool).await;
    ClipSeed { is_hidden: true, ..base.clone() }.insert(&pool).await;

    let mut ids = repo.community_favorites(&for_game(&game), 10).await.unwrap();
    ids.sort();
    let mut expected = vec![visible, nsfw];
    expected.sort();
    assert_eq!(ids, expected);

    let safe = CurationFilter { exclude_nsfw: true, ..for_game(&game) };
    assert_eq!(repo.community_favorites(&safe, 10).await.unwrap(), vec![visible]);
}

#[tokio::test]
async fn test_filter_by_tags() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed::popular(&game);
    let funny = unique("funny");
    let spoiler = unique("spoiler");

    let tagged = ClipSeed { favorite_count: 50, ..base.clone() }.insert(&pool).await;
    let spoiled = ClipSeed { favorite_count: 40, ..base.clone() }.insert(&pool).await;
    let untagged = base.insert(&pool).await;

    tag(&pool, tagged, &funny).await;
    tag(&pool, spoiled, &funny).await;
    tag(&pool, spoiled, &spoiler).await;

    let with_tag = CurationFilter { tag: Some(funny.clone()), ..for_game(&game) };
    assert_eq!(repo.community_favorites(&with_tag, 10).await.unwrap(), vec![tagged, spoiled]);

    let without_spoilers = CurationFilter { exclude_tags: vec![spoiler], ..for_game(&game) };
    assert_eq!(
        repo.community_favorites(&without_spoilers, 10).await.unwrap(),
        vec![tagged, untagged]
    );
}

#[tokio::test]
async fn test_filter_thresholds_streamers_and_timeframe() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed::popular(&game);

    let top_streamer = ClipSeed {
        favorite_count: 50,
        vote_score: 50,
        broadcaster_id: unique("broadcaster"),
        ..base.clone()
    };
    let top = top_streamer.insert(&pool).await;
    sqlx::query("INSERT INTO top_streamers (broadcaster_id) VALUES ($1)")
        .bind(&top_streamer.broadcaster_id)
        .execute(&pool)
        .await
        .unwrap();
    let low_votes = ClipSeed { favorite_count: 40, vote_score: 1, ..base.clone() }.insert(&pool).await;
    let old = ClipSeed { favorite_count: 30, age: Duration::days(20), ..base.clone() }
        .insert(&pool)
        .await;

    let min_votes = CurationFilter { min_vote_score: Some(5), ..for_game(&game) };
    assert_eq!(repo.community_favorites(&min_votes, 10).await.unwrap(), vec![top, old]);

    let streamers = CurationFilter { top_10k_streamers: true, ..for_game(&game) };
    assert_eq!(repo.community_favorites(&streamers, 10).await.unwrap(), vec![top]);

    let this_week = CurationFilter { timeframe: Some(Timeframe::Week), ..for_game(&game) };
    assert_eq!(
        repo.community_favorites(&this_week, 10).await.unwrap(),
        vec![top, low_votes]
    );
}

#[tokio::test]
async fn test_limit_outside_range_uses_default() {
    let Some(pool) = test_pool().await else { return };
    let repo = PgCurationRepository::new(pool.clone());
    let game = unique("game");
    let base = ClipSeed::popular(&game);

    for _ in 0..30 {
        base.insert(&pool).await;
    }

    assert_eq!(repo.community_favorites(&for_game(&game), 500).await.unwrap().len(), 25);
    assert_eq!(repo.community_favorites(&for_game(&game), 0).await.unwrap().len(), 25);
    assert_eq!(repo.community_favorites(&for_game(&game), 5).await.unwrap().len(), 5);
}
