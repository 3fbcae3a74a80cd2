//! Community Repository Implementation
//!
//! PostgreSQL implementation of the CommunityRepository trait.
//! Handles communities together with their members, bans, shared clips and discussions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Community, CommunityBan, CommunityClip, CommunityClipEntry, CommunityClipSort,
    CommunityDiscussion, CommunityMember, CommunityRepository, CommunityRole, CommunitySort,
    DiscussionSort,
};
use crate::infrastructure::database::{PagedQuery, Predicates};
use crate::infrastructure::repositories::clip_row::PublishedClipRow;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};

macro_rules! community_columns {
    () => {
        "id, name, slug, description, icon, owner_id, is_public, member_count, rules, created_at, updated_at"
    };
}

macro_rules! discussion_columns {
    () => {
        "id, community_id, user_id, title, content, is_pinned, is_resolved, \
         vote_score, comment_count, created_at, updated_at"
    };
}

/// Database row representation for the `communities` table.
#[derive(Debug, sqlx::FromRow)]
struct CommunityRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    icon: Option<String>,
    owner_id: Uuid,
    is_public: bool,
    member_count: i32,
    rules: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommunityRow {
    fn into_community(self) -> Community {
        Community {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            icon: self.icon,
            owner_id: self.owner_id,
            is_public: self.is_public,
            member_count: self.member_count,
            rules: self.rules,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Database row representation for the `community_members` table.
#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    community_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_member(self) -> CommunityMember {
        CommunityMember {
            id: self.id,
            community_id: self.community_id,
            user_id: self.user_id,
            role: CommunityRole::from_str(&self.role),
            joined_at: self.joined_at,
        }
    }
}

/// Database row representation for the `community_bans` table.
#[derive(Debug, sqlx::FromRow)]
struct BanRow {
    id: Uuid,
    community_id: Uuid,
    banned_user_id: Uuid,
    banned_by_user_id: Option<Uuid>,
    reason: Option<String>,
    banned_at: DateTime<Utc>,
}

impl BanRow {
    fn into_ban(self) -> CommunityBan {
        CommunityBan {
            id: self.id,
            community_id: self.community_id,
            banned_user_id: self.banned_user_id,
            banned_by_user_id: self.banned_by_user_id,
            reason: self.reason,
            banned_at: self.banned_at,
        }
    }
}

/// Database row representation for the `community_clips` table.
#[derive(Debug, sqlx::FromRow)]
struct CommunityClipRow {
    id: Uuid,
    community_id: Uuid,
    clip_id: Uuid,
    added_by_user_id: Option<Uuid>,
    added_at: DateTime<Utc>,
}

impl CommunityClipRow {
    fn into_community_clip(self) -> CommunityClip {
        CommunityClip {
            id: self.id,
            community_id: self.community_id,
            clip_id: self.clip_id,
            added_by_user_id: self.added_by_user_id,
            added_at: self.added_at,
        }
    }
}

/// A `community_clips` row joined with its clip. Link columns are aliased
/// with a `cc_` prefix to keep them apart from the clip's own columns.
#[derive(Debug, sqlx::FromRow)]
struct CommunityClipEntryRow {
    cc_id: Uuid,
    cc_community_id: Uuid,
    cc_clip_id: Uuid,
    cc_added_by_user_id: Option<Uuid>,
    cc_added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    clip: PublishedClipRow,
}

impl CommunityClipEntryRow {
    fn into_entry(self) -> CommunityClipEntry {
        CommunityClipEntry {
            community_clip: CommunityClip {
                id: self.cc_id,
                community_id: self.cc_community_id,
                clip_id: self.cc_clip_id,
                added_by_user_id: self.cc_added_by_user_id,
                added_at: self.cc_added_at,
            },
            clip: self.clip.into_published_clip(),
        }
    }
}

/// Database row representation for the `community_discussions` table.
#[derive(Debug, sqlx::FromRow)]
struct DiscussionRow {
    id: Uuid,
    community_id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    is_pinned: bool,
    is_resolved: bool,
    vote_score: i32,
    comment_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscussionRow {
    fn into_discussion(self) -> CommunityDiscussion {
        CommunityDiscussion {
            id: self.id,
            community_id: self.community_id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            is_pinned: self.is_pinned,
            is_resolved: self.is_resolved,
            vote_score: self.vote_score,
            comment_count: self.comment_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn community_order(sort: CommunitySort) -> &'static str {
    match sort {
        CommunitySort::Members => "member_count DESC, created_at DESC",
        CommunitySort::Name => "name ASC, created_at DESC",
        CommunitySort::New => "created_at DESC",
    }
}

fn clip_order(sort: CommunityClipSort) -> &'static str {
    match sort {
        CommunityClipSort::Trending => "c.vote_score DESC, cc.added_at DESC",
        CommunityClipSort::Recent => "cc.added_at DESC",
    }
}

fn discussion_order(sort: DiscussionSort) -> &'static str {
    match sort {
        DiscussionSort::Trending => "is_pinned DESC, vote_score DESC, created_at DESC",
        DiscussionSort::Recent => "is_pinned DESC, updated_at DESC",
        DiscussionSort::Newest => "is_pinned DESC, created_at DESC",
    }
}

/// PostgreSQL community repository implementation.
///
/// `member_count` is kept in step with membership inside the same
/// transaction as every add, remove and ban.
#[derive(Clone)]
pub struct PgCommunityRepository {
    pool: PgPool,
}

impl PgCommunityRepository {
    /// Create a new PgCommunityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List bans across every community, newest first.
    pub async fn list_all_bans(&self, limit: i64, offset: i64) -> Result<Page<CommunityBan>, AppError> {
        let query = PagedQuery {
            table: "community_bans",
            count_sql: "SELECT COUNT(*) FROM community_bans",
            select_sql: "SELECT id, community_id, banned_user_id, banned_by_user_id, reason, banned_at \
                         FROM community_bans",
            order_by: "banned_at DESC",
        };

        let page = query
            .fetch::<BanRow, _>(&self.pool, PageRequest::new(limit, offset), |_: &mut Predicates<'_, '_>| {})
            .await?;

        Ok(page.map(BanRow::into_ban))
    }
}

#[async_trait]
impl CommunityRepository for PgCommunityRepository {
    async fn create(&self, community: &Community) -> Result<Community, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(concat!(
            "INSERT INTO communities (",
            community_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING ",
            community_columns!()
        ))
        .bind(community.id)
        .bind(&community.name)
        .bind(&community.slug)
        .bind(&community.description)
        .bind(&community.icon)
        .bind(community.owner_id)
        .bind(community.is_public)
        .bind(community.member_count)
        .bind(&community.rules)
        .bind(community.created_at)
        .bind(community.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                format!("Community slug '{}' is already taken", community.slug),
            )
        })?;

        tracing::debug!(community_id = %row.id, slug = %row.slug, "Community created");

        Ok(row.into_community())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Community>, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(concat!(
            "SELECT ",
            community_columns!(),
            " FROM communities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CommunityRow::into_community))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Community>, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(concat!(
            "SELECT ",
            community_columns!(),
            " FROM communities WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CommunityRow::into_community))
    }

    async fn update(&self, community: &Community) -> Result<Community, AppError> {
        let row = sqlx::query_as::<_, CommunityRow>(concat!(
            "UPDATE communities
             SET name = $2, slug = $3, description = $4, icon = $5, is_public = $6,
                 rules = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING ",
            community_columns!()
        ))
        .bind(community.id)
        .bind(&community.name)
        .bind(&community.slug)
        .bind(&community.description)
        .bind(&community.icon)
        .bind(community.is_public)
        .bind(&community.rules)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                format!("Community slug '{}' is already taken", community.slug),
            )
        })?;

        row.map(CommunityRow::into_community)
            .ok_or_else(|| AppError::NotFound(format!("Community {} not found", community.id)))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM communities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Community {} not found", id)));
        }

        Ok(())
    }

    async fn list(
        &self,
        public_only: bool,
        sort: CommunitySort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Community>, AppError> {
        let query = PagedQuery {
            table: "communities",
            count_sql: "SELECT COUNT(*) FROM communities",
            select_sql: concat!("SELECT ", community_columns!(), " FROM communities"),
            order_by: community_order(sort),
        };

        let page = query
            .fetch::<CommunityRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    if public_only {
                        p.push("is_public = true");
                    }
                },
            )
            .await?;

        Ok(page.map(CommunityRow::into_community))
    }

    async fn search(&self, search: &str, limit: i64, offset: i64) -> Result<Page<Community>, AppError> {
        let query = PagedQuery {
            table: "communities",
            count_sql: "SELECT COUNT(*) FROM communities",
            select_sql: concat!("SELECT ", community_columns!(), " FROM communities"),
            order_by: "member_count DESC, name ASC",
        };

        let page = query
            .fetch::<CommunityRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.contains_ci("name", search);
                },
            )
            .await?;

        Ok(page.map(CommunityRow::into_community))
    }

    #[tracing::instrument(skip(self, member), fields(community_id = %member.community_id, user_id = %member.user_id))]
    async fn add_member(&self, member: &CommunityMember) -> Result<CommunityMember, AppError> {
        let mut tx = self.pool.begin().await?;

        // Banned users are refused here rather than by a constraint
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO community_members (id, community_id, user_id, role, joined_at)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (
                SELECT 1 FROM community_bans WHERE community_id = $2 AND banned_user_id = $3
            )
            RETURNING id, community_id, user_id, role, joined_at
            "#,
        )
        .bind(member.id)
        .bind(member.community_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "User is already a member of this community")
        })?;

        let Some(row) = row else {
            return Err(AppError::Conflict(
                "User is banned from this community".to_string(),
            ));
        };

        sqlx::query("UPDATE communities SET member_count = member_count + 1 WHERE id = $1")
            .bind(member.community_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into_member())
    }

    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of community {}",
                user_id, community_id
            )));
        }

        sqlx::query(
            "UPDATE communities SET member_count = GREATEST(member_count - 1, 0) WHERE id = $1",
        )
        .bind(community_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityMember>, AppError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, community_id, user_id, role, joined_at
            FROM community_members
            WHERE community_id = $1 AND user_id = $2
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn list_members(
        &self,
        community_id: Uuid,
        role: Option<CommunityRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityMember>, AppError> {
        let query = PagedQuery {
            table: "community_members",
            count_sql: "SELECT COUNT(*) FROM community_members",
            select_sql: "SELECT id, community_id, user_id, role, joined_at FROM community_members",
            order_by: "joined_at DESC",
        };

        let page = query
            .fetch::<MemberRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("community_id", community_id)
                        .eq_opt("role", role.map(|r| r.as_str()));
                },
            )
            .await?;

        Ok(page.map(MemberRow::into_member))
    }

    async fn update_member_role(
        &self,
        community_id: Uuid,
        user_id: Uuid,
        role: CommunityRole,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE community_members
            SET role = $3
            WHERE community_id = $1 AND user_id = $2
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User {} is not a member of community {}",
                user_id, community_id
            )));
        }

        Ok(())
    }

    async fn is_member(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM community_members WHERE community_id = $1 AND user_id = $2)",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn is_banned(&self, community_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM community_bans WHERE community_id = $1 AND banned_user_id = $2)",
        )
        .bind(community_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, ban), fields(community_id = %ban.community_id, user_id = %ban.banned_user_id))]
    async fn ban_member(&self, ban: &CommunityBan) -> Result<CommunityBan, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM community_members WHERE community_id = $1 AND user_id = $2",
        )
        .bind(ban.community_id)
        .bind(ban.banned_user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed > 0 {
            sqlx::query(
                "UPDATE communities SET member_count = GREATEST(member_count - 1, 0) WHERE id = $1",
            )
            .bind(ban.community_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, BanRow>(
            r#"
            INSERT INTO community_bans (id, community_id, banned_user_id, banned_by_user_id, reason, banned_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, community_id, banned_user_id, banned_by_user_id, reason, banned_at
            "#,
        )
        .bind(ban.id)
        .bind(ban.community_id)
        .bind(ban.banned_user_id)
        .bind(ban.banned_by_user_id)
        .bind(&ban.reason)
        .bind(ban.banned_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "User is already banned from this community"))?;

        tx.commit().await?;

        tracing::info!(membership_removed = removed > 0, "Community member banned");

        Ok(row.into_ban())
    }

    async fn unban_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM community_bans WHERE community_id = $1 AND banned_user_id = $2",
        )
        .bind(community_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User {} is not banned from community {}",
                user_id, community_id
            )));
        }

        Ok(())
    }

    async fn find_ban(&self, ban_id: Uuid) -> Result<Option<CommunityBan>, AppError> {
        let row = sqlx::query_as::<_, BanRow>(
            r#"
            SELECT id, community_id, banned_user_id, banned_by_user_id, reason, banned_at
            FROM community_bans
            WHERE id = $1
            "#,
        )
        .bind(ban_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BanRow::into_ban))
    }

    async fn list_bans(
        &self,
        community_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityBan>, AppError> {
        let query = PagedQuery {
            table: "community_bans",
            count_sql: "SELECT COUNT(*) FROM community_bans",
            select_sql: "SELECT id, community_id, banned_user_id, banned_by_user_id, reason, banned_at \
                         FROM community_bans",
            order_by: "banned_at DESC",
        };

        let page = query
            .fetch::<BanRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("community_id", community_id);
                },
            )
            .await?;

        Ok(page.map(BanRow::into_ban))
    }

    async fn add_clip(&self, community_clip: &CommunityClip) -> Result<CommunityClip, AppError> {
        let row = sqlx::query_as::<_, CommunityClipRow>(
            r#"
            INSERT INTO community_clips (id, community_id, clip_id, added_by_user_id, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (community_id, clip_id) DO NOTHING
            RETURNING id, community_id, clip_id, added_by_user_id, added_at
            "#,
        )
        .bind(community_clip.id)
        .bind(community_clip.community_id)
        .bind(community_clip.clip_id)
        .bind(community_clip.added_by_user_id)
        .bind(community_clip.added_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CommunityClipRow::into_community_clip).ok_or_else(|| {
            AppError::Conflict(format!(
                "Clip {} is already in community {}",
                community_clip.clip_id, community_clip.community_id
            ))
        })
    }

    async fn remove_clip(&self, community_id: Uuid, clip_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM community_clips WHERE community_id = $1 AND clip_id = $2",
        )
        .bind(community_id)
        .bind(clip_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Clip {} is not in community {}",
                clip_id, community_id
            )));
        }

        Ok(())
    }

    async fn list_clips(
        &self,
        community_id: Uuid,
        sort: CommunityClipSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityClipEntry>, AppError> {
        let query = PagedQuery {
            table: "community_clips",
            count_sql: "SELECT COUNT(*) FROM community_clips cc",
            select_sql: concat!(
                "SELECT cc.id AS cc_id, cc.community_id AS cc_community_id, cc.clip_id AS cc_clip_id, \
                 cc.added_by_user_id AS cc_added_by_user_id, cc.added_at AS cc_added_at, ",
                published_clip_columns!("c."),
                " FROM community_clips cc JOIN clips c ON cc.clip_id = c.id"
            ),
            order_by: clip_order(sort),
        };

        let page = query
            .fetch::<CommunityClipEntryRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("cc.community_id", community_id);
                },
            )
            .await?;

        Ok(page.map(CommunityClipEntryRow::into_entry))
    }

    async fn create_discussion(
        &self,
        discussion: &CommunityDiscussion,
    ) -> Result<CommunityDiscussion, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(concat!(
            "INSERT INTO community_discussions (",
            discussion_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING ",
            discussion_columns!()
        ))
        .bind(discussion.id)
        .bind(discussion.community_id)
        .bind(discussion.user_id)
        .bind(&discussion.title)
        .bind(&discussion.content)
        .bind(discussion.is_pinned)
        .bind(discussion.is_resolved)
        .bind(discussion.vote_score)
        .bind(discussion.comment_count)
        .bind(discussion.created_at)
        .bind(discussion.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_discussion())
    }

    async fn find_discussion(&self, id: Uuid) -> Result<Option<CommunityDiscussion>, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(concat!(
            "SELECT ",
            discussion_columns!(),
            " FROM community_discussions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DiscussionRow::into_discussion))
    }

    async fn update_discussion(
        &self,
        discussion: &CommunityDiscussion,
    ) -> Result<CommunityDiscussion, AppError> {
        let row = sqlx::query_as::<_, DiscussionRow>(concat!(
            "UPDATE community_discussions
             SET title = $2, content = $3, is_pinned = $4, is_resolved = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING ",
            discussion_columns!()
        ))
        .bind(discussion.id)
        .bind(&discussion.title)
        .bind(&discussion.content)
        .bind(discussion.is_pinned)
        .bind(discussion.is_resolved)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiscussionRow::into_discussion)
            .ok_or_else(|| AppError::NotFound(format!("Discussion {} not found", discussion.id)))
    }

    async fn delete_discussion(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM community_discussions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Discussion {} not found", id)));
        }

        Ok(())
    }

    async fn list_discussions(
        &self,
        community_id: Uuid,
        sort: DiscussionSort,
        limit: i64,
        offset: i64,
    ) -> Result<Page<CommunityDiscussion>, AppError> {
        let query = PagedQuery {
            table: "community_discussions",
            count_sql: "SELECT COUNT(*) FROM community_discussions",
            select_sql: concat!("SELECT ", discussion_columns!(), " FROM community_discussions"),
            order_by: discussion_order(sort),
        };

        let page = query
            .fetch::<DiscussionRow, _>(
                &self.pool,
                PageRequest::new(limit, offset),
                |p: &mut Predicates<'_, '_>| {
                    p.eq("community_id", community_id);
                },
            )
            .await?;

        Ok(page.map(DiscussionRow::into_discussion))
    }
}
