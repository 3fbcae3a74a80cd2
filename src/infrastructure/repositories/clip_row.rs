//! Published clip row shared by every repository that joins `clips`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::PublishedClip;

/// Column list matching `PublishedClipRow`, each prefixed with the given table alias.
macro_rules! published_clip_columns {
    ($p:literal) => {
        concat!(
            $p, "id, ", $p, "twitch_clip_id, ", $p, "twitch_clip_url, ", $p, "embed_url, ",
            $p, "title, ", $p, "creator_name, ", $p, "creator_id, ", $p, "broadcaster_name, ",
            $p, "broadcaster_id, ", $p, "game_id, ", $p, "game_name, ", $p, "language, ",
            $p, "thumbnail_url, ", $p, "duration, ", $p, "view_count, ", $p, "created_at, ",
            $p, "imported_at, ", $p, "vote_score, ", $p, "comment_count, ", $p, "favorite_count, ",
            $p, "is_featured, ", $p, "is_nsfw, ", $p, "is_removed, ", $p, "removed_reason, ",
            $p, "is_hidden, ", $p, "submitted_by_user_id, ", $p, "submitted_at, ",
            $p, "trending_score, ", $p, "hot_score, ", $p, "dmca_removed, ",
            $p, "dmca_notice_id, ", $p, "dmca_removed_at, ", $p, "dmca_reinstated_at"
        )
    };
}

/// Database row representation for the `clips` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PublishedClipRow {
    pub(crate) id: Uuid,
    twitch_clip_id: String,
    twitch_clip_url: String,
    embed_url: String,
    title: String,
    creator_name: String,
    creator_id: Option<String>,
    broadcaster_name: String,
    broadcaster_id: Option<String>,
    game_id: Option<String>,
    game_name: Option<String>,
    language: Option<String>,
    thumbnail_url: Option<String>,
    duration: Option<f64>,
    view_count: i32,
    created_at: DateTime<Utc>,
    imported_at: DateTime<Utc>,
    vote_score: i32,
    comment_count: i32,
    favorite_count: i32,
    is_featured: bool,
    is_nsfw: bool,
    is_removed: bool,
    removed_reason: Option<String>,
    is_hidden: bool,
    submitted_by_user_id: Option<Uuid>,
    submitted_at: Option<DateTime<Utc>>,
    trending_score: f64,
    hot_score: f64,
    dmca_removed: bool,
    dmca_notice_id: Option<Uuid>,
    dmca_removed_at: Option<DateTime<Utc>>,
    dmca_reinstated_at: Option<DateTime<Utc>>,
}

impl PublishedClipRow {
    pub(crate) fn into_published_clip(self) -> PublishedClip {
        PublishedClip {
            id: self.id,
            twitch_clip_id: self.twitch_clip_id,
            twitch_clip_url: self.twitch_clip_url,
            embed_url: self.embed_url,
            title: self.title,
            creator_name: self.creator_name,
            creator_id: self.creator_id,
            broadcaster_name: self.broadcaster_name,
            broadcaster_id: self.broadcaster_id,
            game_id: self.game_id,
            game_name: self.game_name,
            language: self.language,
            thumbnail_url: self.thumbnail_url,
            duration: self.duration,
            view_count: self.view_count,
            created_at: self.created_at,
            imported_at: self.imported_at,
            vote_score: self.vote_score,
            comment_count: self.comment_count,
            favorite_count: self.favorite_count,
            is_featured: self.is_featured,
            is_nsfw: self.is_nsfw,
            is_removed: self.is_removed,
            removed_reason: self.removed_reason,
            is_hidden: self.is_hidden,
            submitted_by_user_id: self.submitted_by_user_id,
            submitted_at: self.submitted_at,
            trending_score: self.trending_score,
            hot_score: self.hot_score,
            dmca_removed: self.dmca_removed,
            dmca_notice_id: self.dmca_notice_id,
            dmca_removed_at: self.dmca_removed_at,
            dmca_reinstated_at: self.dmca_reinstated_at,
        }
    }
}
