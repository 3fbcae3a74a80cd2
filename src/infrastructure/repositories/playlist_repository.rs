//! Playlist Repository Implementation
//!
//! PostgreSQL implementation of the PlaylistRepository trait.
//! Item ordering is kept contiguous by the repository, not by the schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    CollaboratorPermission, Playlist, PlaylistClipRef, PlaylistCollaborator, PlaylistItem,
    PlaylistRepository, PlaylistVisibility,
};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::infrastructure::repositories::clip_row::PublishedClipRow;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! playlist_columns {
    () => {
        "id, user_id, title, description, cover_url, visibility, share_token, \
         view_count, share_count, like_count, created_at, updated_at, deleted_at"
    };
}

macro_rules! collaborator_columns {
    () => {
        "id, playlist_id, user_id, permission, invited_by, invited_at, created_at, updated_at"
    };
}

/// Closes gaps left by a removal: indices become `0..n` in their existing order.
const REINDEX_SQL: &str = r#"
    UPDATE playlist_items pi
    SET order_index = ranked.new_index
    FROM (
        SELECT id, (ROW_NUMBER() OVER (ORDER BY order_index ASC, id ASC) - 1)::INT AS new_index
        FROM playlist_items
        WHERE playlist_id = $1
    ) ranked
    WHERE pi.id = ranked.id AND pi.order_index <> ranked.new_index
"#;

/// Database row representation for the `playlists` table.
#[derive(Debug, sqlx::FromRow)]
struct PlaylistRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    cover_url: Option<String>,
    visibility: String,
    share_token: Option<String>,
    view_count: i32,
    share_count: i32,
    like_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl PlaylistRow {
    fn into_playlist(self) -> Playlist {
        Playlist {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            cover_url: self.cover_url,
            visibility: PlaylistVisibility::from_str(&self.visibility),
            share_token: self.share_token,
            view_count: self.view_count,
            share_count: self.share_count,
            like_count: self.like_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// Database row representation for the `playlist_items` table.
#[derive(Debug, sqlx::FromRow)]
struct PlaylistItemRow {
    id: i64,
    playlist_id: Uuid,
    clip_id: Uuid,
    order_index: i32,
    added_at: DateTime<Utc>,
}

impl PlaylistItemRow {
    fn into_item(self) -> PlaylistItem {
        PlaylistItem {
            id: self.id,
            playlist_id: self.playlist_id,
            clip_id: self.clip_id,
            order_index: self.order_index,
            added_at: self.added_at,
        }
    }
}

/// A joined clip plus its position in the playlist.
#[derive(Debug, sqlx::FromRow)]
struct PlaylistClipRow {
    #[sqlx(flatten)]
    clip: PublishedClipRow,
    order_index: i32,
}

impl PlaylistClipRow {
    fn into_clip_ref(self) -> PlaylistClipRef {
        PlaylistClipRef {
            clip: self.clip.into_published_clip(),
            order_index: self.order_index,
        }
    }
}

/// Database row representation for the `playlist_collaborators` table.
#[derive(Debug, sqlx::FromRow)]
struct CollaboratorRow {
    id: Uuid,
    playlist_id: Uuid,
    user_id: Uuid,
    permission: String,
    invited_by: Option<Uuid>,
    invited_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CollaboratorRow {
    fn into_collaborator(self) -> PlaylistCollaborator {
        PlaylistCollaborator {
            id: self.id,
            playlist_id: self.playlist_id,
            user_id: self.user_id,
            permission: CollaboratorPermission::from_str(&self.permission),
            invited_by: self.invited_by,
            invited_at: self.invited_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL playlist repository implementation.
#[derive(Clone)]
pub struct PgPlaylistRepository {
    pool: PgPool,
}

impl PgPlaylistRepository {
    /// Create a new PgPlaylistRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn playlist_query(order_by: &'static str) -> PagedQuery<'static> {
        PagedQuery {
            table: "playlists",
            count_sql: "SELECT COUNT(*) FROM playlists",
            select_sql: concat!("SELECT ", playlist_columns!(), " FROM playlists"),
            order_by,
        }
    }

    /// Bump the view counter of a live playlist.
    pub async fn increment_view_count(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE playlists SET view_count = view_count + 1 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PlaylistRepository for PgPlaylistRepository {
    async fn create(&self, playlist: &Playlist) -> Result<Playlist, AppError> {
        let row = sqlx::query_as::<_, PlaylistRow>(concat!(
            "INSERT INTO playlists (",
            playlist_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING ",
            playlist_columns!()
        ))
        .bind(playlist.id)
        .bind(playlist.user_id)
        .bind(&playlist.title)
        .bind(&playlist.description)
        .bind(&playlist.cover_url)
        .bind(playlist.visibility.as_str())
        .bind(&playlist.share_token)
        .bind(playlist.view_count)
        .bind(playlist.share_count)
        .bind(playlist.like_count)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .bind(playlist.deleted_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(playlist_id = %row.id, "Playlist created");

        Ok(row.into_playlist())
    }

    #[tracing::instrument(skip(self, playlist), fields(playlist_id = %playlist.id))]
    async fn create_with_clips(
        &self,
        playlist: &Playlist,
        source_playlist_id: Uuid,
    ) -> Result<Playlist, AppError> {
        let mut tx = self.pool.begin().await?;

        let source_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM playlists WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(source_playlist_id)
        .fetch_one(&mut *tx)
        .await?;

        if !source_exists {
            return Err(AppError::NotFound(format!(
                "Playlist {} not found",
                source_playlist_id
            )));
        }

        let row = sqlx::query_as::<_, PlaylistRow>(concat!(
            "INSERT INTO playlists (",
            playlist_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 0, 0, $8, $9, NULL) RETURNING ",
            playlist_columns!()
        ))
        .bind(playlist.id)
        .bind(playlist.user_id)
        .bind(&playlist.title)
        .bind(&playlist.description)
        .bind(&playlist.cover_url)
        .bind(playlist.visibility.as_str())
        .bind(&playlist.share_token)
        .bind(playlist.created_at)
        .bind(playlist.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let copied = sqlx::query(
            r#"
            INSERT INTO playlist_items (playlist_id, clip_id, order_index, added_at)
            SELECT $1, clip_id, (ROW_NUMBER() OVER (ORDER BY order_index ASC, id ASC) - 1)::INT, NOW()
            FROM playlist_items
            WHERE playlist_id = $2
            "#,
        )
        .bind(row.id)
        .bind(source_playlist_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::debug!(source_playlist_id = %source_playlist_id, copied, "Playlist copied");

        Ok(row.into_playlist())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Playlist>, AppError> {
        let row = sqlx::query_as::<_, PlaylistRow>(concat!(
            "SELECT ",
            playlist_columns!(),
            " FROM playlists WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PlaylistRow::into_playlist))
    }

    async fn find_by_share_token(&self, token: &str) -> Result<Option<Playlist>, AppError> {
        let row = sqlx::query_as::<_, PlaylistRow>(concat!(
            "SELECT ",
            playlist_columns!(),
            " FROM playlists WHERE share_token = $1 AND deleted_at IS NULL"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PlaylistRow::into_playlist))
    }

    async fn regenerate_share_token(&self, id: Uuid) -> Result<String, AppError> {
        let token = Playlist::generate_share_token();

        let result = sqlx::query(
            r#"
            UPDATE playlists
            SET share_token = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(&token)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Share token collision, try again"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Playlist {} not found", id)));
        }

        Ok(token)
    }

    async fn update(&self, playlist: &Playlist) -> Result<Playlist, AppError> {
        let row = sqlx::query_as::<_, PlaylistRow>(concat!(
            "UPDATE playlists
             SET title = $2, description = $3, cover_url = $4, visibility = $5, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING ",
            playlist_columns!()
        ))
        .bind(playlist.id)
        .bind(&playlist.title)
        .bind(&playlist.description)
        .bind(&playlist.cover_url)
        .bind(playlist.visibility.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PlaylistRow::into_playlist)
            .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist.id)))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE playlists SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Playlist {} not found", id)));
        }

        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Playlist>, AppError> {
        let page = Self::playlist_query("created_at DESC")
            .fetch::<PlaylistRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("user_id", user_id).push("deleted_at IS NULL");
                },
            )
            .await?;

        Ok(page.map(PlaylistRow::into_playlist))
    }

    async fn list_public(&self, limit: i64, offset: i64) -> Result<Page<Playlist>, AppError> {
        let page = Self::playlist_query("like_count DESC, created_at DESC")
            .fetch::<PlaylistRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.push("visibility = 'public'").push("deleted_at IS NULL");
                },
            )
            .await?;

        Ok(page.map(PlaylistRow::into_playlist))
    }

    async fn add_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO playlist_items (playlist_id, clip_id, order_index, added_at)
            SELECT $1, $2, COALESCE(MAX(order_index) + 1, 0), NOW()
            FROM playlist_items
            WHERE playlist_id = $1
            ON CONFLICT (playlist_id, clip_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(clip_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM playlist_items WHERE playlist_id = $1 AND clip_id = $2")
            .bind(playlist_id)
            .bind(clip_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Clip {} not found in playlist {}",
                clip_id, playlist_id
            )));
        }

        let shifted = sqlx::query(REINDEX_SQL)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::debug!(shifted, "Playlist reindexed after removal");

        Ok(())
    }

    async fn list_clips(
        &self,
        playlist_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<PlaylistClipRef>, AppError> {
        let query = PagedQuery {
            table: "playlist_items",
            count_sql: "SELECT COUNT(*) FROM playlist_items pi",
            select_sql: concat!(
                "SELECT ",
                published_clip_columns!("c."),
                ", pi.order_index FROM playlist_items pi JOIN clips c ON pi.clip_id = c.id"
            ),
            order_by: "pi.order_index ASC",
        };

        let page = query
            .fetch::<PlaylistClipRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("pi.playlist_id", playlist_id);
                },
            )
            .await?;

        Ok(page.map(PlaylistClipRow::into_clip_ref))
    }

    async fn list_items(&self, playlist_id: Uuid) -> Result<Vec<PlaylistItem>, AppError> {
        let rows = sqlx::query_as::<_, PlaylistItemRow>(
            r#"
            SELECT id, playlist_id, clip_id, order_index, added_at
            FROM playlist_items
            WHERE playlist_id = $1
            ORDER BY order_index ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PlaylistItemRow::into_item).collect())
    }

    async fn clip_count(&self, playlist_id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM playlist_items WHERE playlist_id = $1",
        )
        .bind(playlist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn has_clip(&self, playlist_id: Uuid, clip_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM playlist_items WHERE playlist_id = $1 AND clip_id = $2)",
        )
        .bind(playlist_id)
        .bind(clip_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, clip_ids), fields(count = clip_ids.len()))]
    async fn reorder_clips(&self, playlist_id: Uuid, clip_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for (index, clip_id) in clip_ids.iter().enumerate() {
            let result = sqlx::query(
                r#"
                UPDATE playlist_items
                SET order_index = $1
                WHERE playlist_id = $2 AND clip_id = $3
                "#,
            )
            .bind(index as i32)
            .bind(playlist_id)
            .bind(clip_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "Clip {} not found in playlist {}",
                    clip_id, playlist_id
                )));
            }
        }

        tx.commit().await?;

        Ok(())
    }

    async fn like(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO playlist_likes (id, user_id, playlist_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, playlist_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(playlist_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            sqlx::query("UPDATE playlists SET like_count = like_count + 1 WHERE id = $1")
                .bind(playlist_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    async fn unlike(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM playlist_likes WHERE user_id = $1 AND playlist_id = $2",
        )
        .bind(user_id)
        .bind(playlist_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if removed {
            sqlx::query(
                "UPDATE playlists SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1",
            )
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(removed)
    }

    async fn is_liked(&self, user_id: Uuid, playlist_id: Uuid) -> Result<bool, AppError> {
        let liked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM playlist_likes WHERE user_id = $1 AND playlist_id = $2)",
        )
        .bind(user_id)
        .bind(playlist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    async fn add_collaborator(
        &self,
        collaborator: &PlaylistCollaborator,
    ) -> Result<PlaylistCollaborator, AppError> {
        let row = sqlx::query_as::<_, CollaboratorRow>(concat!(
            "INSERT INTO playlist_collaborators (",
            collaborator_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (playlist_id, user_id)
             DO UPDATE SET permission = EXCLUDED.permission, updated_at = NOW()
             RETURNING ",
            collaborator_columns!()
        ))
        .bind(collaborator.id)
        .bind(collaborator.playlist_id)
        .bind(collaborator.user_id)
        .bind(collaborator.permission.as_str())
        .bind(collaborator.invited_by)
        .bind(collaborator.invited_at)
        .bind(collaborator.created_at)
        .bind(collaborator.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_collaborator())
    }

    async fn remove_collaborator(&self, playlist_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM playlist_collaborators WHERE playlist_id = $1 AND user_id = $2",
        )
        .bind(playlist_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User {} is not a collaborator on playlist {}",
                user_id, playlist_id
            )));
        }

        Ok(())
    }

    async fn list_collaborators(&self, playlist_id: Uuid) -> Result<Vec<PlaylistCollaborator>, AppError> {
        let rows = sqlx::query_as::<_, CollaboratorRow>(concat!(
            "SELECT ",
            collaborator_columns!(),
            " FROM playlist_collaborators WHERE playlist_id = $1 ORDER BY invited_at ASC"
        ))
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CollaboratorRow::into_collaborator).collect())
    }

    async fn find_collaborator(
        &self,
        playlist_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlaylistCollaborator>, AppError> {
        let row = sqlx::query_as::<_, CollaboratorRow>(concat!(
            "SELECT ",
            collaborator_columns!(),
            " FROM playlist_collaborators WHERE playlist_id = $1 AND user_id = $2"
        ))
        .bind(playlist_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CollaboratorRow::into_collaborator))
    }
}
