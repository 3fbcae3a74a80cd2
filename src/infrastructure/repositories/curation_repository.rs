//! Curation Repository Implementation
//!
//! Every strategy is a fixed `FROM` clause, a set of static conditions and an
//! ordering, composed with the caller's filter through `Predicates`.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{CurationFilter, CurationRepository};
use crate::infrastructure::database::{Comparison, Predicates};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Static shape of one curation query.
struct Strategy {
    name: &'static str,
    from: &'static str,
    conditions: &'static [&'static str],
    order_by: &'static str,
    uses_timeframe: bool,
}

const SLEEPER_HITS: Strategy = Strategy {
    name: "sleeper_hits",
    from: "SELECT c.id FROM clips c JOIN clip_analytics ca ON ca.clip_id = c.id",
    conditions: &[
        "ca.retention_rate IS NOT NULL",
        "ca.retention_rate > 0.6",
        "c.view_count < 500",
    ],
    order_by: "ca.retention_rate DESC, c.vote_score DESC",
    uses_timeframe: true,
};

const VIRAL_VELOCITY: Strategy = Strategy {
    name: "viral_velocity",
    from: "SELECT c.id FROM clips c",
    conditions: &[
        "c.created_at > NOW() - INTERVAL '48 hours'",
        "EXTRACT(EPOCH FROM (NOW() - c.created_at)) / 3600 > 0.5",
    ],
    order_by: "(c.view_count + c.vote_score * 10 + c.comment_count * 5 + c.favorite_count * 3)::FLOAT \
               / (EXTRACT(EPOCH FROM (NOW() - c.created_at)) / 3600) DESC",
    uses_timeframe: true,
};

const COMMUNITY_FAVORITES: Strategy = Strategy {
    name: "community_favorites",
    from: "SELECT c.id FROM clips c",
    conditions: &["c.view_count > 10", "c.favorite_count > 0"],
    order_by: "c.favorite_count::FLOAT / c.view_count DESC, c.favorite_count DESC",
    uses_timeframe: true,
};

const DEEP_CUTS: Strategy = Strategy {
    name: "deep_cuts",
    from: "SELECT c.id FROM clips c \
           JOIN (SELECT clip_id, AVG(progress_seconds) AS avg_progress \
                 FROM watch_history GROUP BY clip_id HAVING AVG(progress_seconds) > 15) wh \
           ON wh.clip_id = c.id",
    conditions: &["c.vote_score > 3", "c.trending_score < 5"],
    order_by: "wh.avg_progress DESC, c.vote_score DESC",
    uses_timeframe: true,
};

const FRESH_FACES: Strategy = Strategy {
    name: "fresh_faces",
    from: "SELECT c.id FROM clips c \
           JOIN (SELECT creator_id FROM clips \
                 WHERE is_removed = false AND creator_id IS NOT NULL \
                 GROUP BY creator_id HAVING COUNT(*) <= 5) new_creators \
           ON new_creators.creator_id = c.creator_id",
    conditions: &[],
    order_by: "c.vote_score DESC, c.view_count DESC",
    uses_timeframe: true,
};

const SIMILAR_VIBES: Strategy = Strategy {
    name: "similar_vibes",
    from: "SELECT c.id FROM clips c JOIN clips seed ON seed.embedding IS NOT NULL",
    conditions: &["c.embedding IS NOT NULL"],
    order_by: "c.embedding <=> seed.embedding ASC",
    uses_timeframe: false,
};

const CROSS_GAME_HITS: Strategy = Strategy {
    name: "cross_game_hits",
    from: "SELECT c.id FROM clips c",
    conditions: &[],
    order_by: "c.vote_score DESC, c.view_count DESC",
    uses_timeframe: true,
};

const CONTROVERSIAL: Strategy = Strategy {
    name: "controversial",
    from: "SELECT c.id FROM clips c",
    conditions: &["c.comment_count > 3", "c.view_count > 10"],
    order_by: "c.comment_count::FLOAT * (c.comment_count::FLOAT / c.view_count) DESC",
    uses_timeframe: true,
};

const BINGE_WORTHY: Strategy = Strategy {
    name: "binge_worthy",
    from: "SELECT c.id FROM clips c",
    conditions: &["c.id IN (\
        SELECT wh.clip_id FROM watch_history wh \
        WHERE wh.session_id IS NOT NULL AND wh.session_id IN (\
            SELECT session_id FROM watch_history WHERE session_id IS NOT NULL \
            GROUP BY session_id HAVING COUNT(DISTINCT clip_id) >= 3))"],
    order_by: "c.view_count DESC, c.vote_score DESC",
    uses_timeframe: true,
};

const RISING_STARS: Strategy = Strategy {
    name: "rising_stars",
    from: "WITH creator_stats AS (\
               SELECT creator_id, AVG(vote_score) AS overall_avg FROM clips \
               WHERE is_removed = false AND creator_id IS NOT NULL \
               GROUP BY creator_id HAVING COUNT(*) >= 3), \
           recent_stats AS (\
               SELECT creator_id, AVG(vote_score) AS recent_avg FROM clips \
               WHERE is_removed = false AND creator_id IS NOT NULL \
                 AND created_at > NOW() - INTERVAL '30 days' \
               GROUP BY creator_id) \
           SELECT c.id FROM clips c \
           JOIN creator_stats cs ON cs.creator_id = c.creator_id \
           JOIN recent_stats rs ON rs.creator_id = c.creator_id",
    conditions: &[
        "c.created_at > NOW() - INTERVAL '30 days'",
        "rs.recent_avg > cs.overall_avg * 1.5",
    ],
    order_by: "rs.recent_avg / GREATEST(cs.overall_avg, 1) DESC, c.vote_score DESC",
    uses_timeframe: true,
};

/// Predicates every strategy shares.
fn apply_filter(p: &mut Predicates<'_, 'static>, filter: &CurationFilter) {
    p.push("c.is_removed = false").push("c.is_hidden = false");

    if filter.exclude_nsfw {
        p.push("c.is_nsfw = false");
    }

    p.eq_opt("c.game_id", filter.game_id.clone())
        .eq_opt("c.broadcaster_id", filter.broadcaster_id.clone());

    if let Some(tag) = filter.tag.clone() {
        p.with(|b| {
            b.push(
                "EXISTS (SELECT 1 FROM clip_tags ct JOIN tags t ON t.id = ct.tag_id \
                 WHERE ct.clip_id = c.id AND t.slug = ",
            )
            .push_bind(tag)
            .push(")");
        });
    }

    if !filter.exclude_tags.is_empty() {
        let excluded = filter.exclude_tags.clone();
        p.with(|b| {
            b.push(
                "NOT EXISTS (SELECT 1 FROM clip_tags ct JOIN tags t ON t.id = ct.tag_id \
                 WHERE ct.clip_id = c.id AND t.slug = ANY(",
            )
            .push_bind(excluded)
            .push("))");
        });
    }

    p.eq_opt("c.language", filter.language.clone())
        .cmp_opt("c.vote_score", Comparison::Gte, filter.min_vote_score)
        .cmp_opt("c.view_count", Comparison::Gte, filter.min_view_count);

    if filter.top_10k_streamers {
        p.push("c.broadcaster_id IN (SELECT broadcaster_id FROM top_streamers)");
    }
}

impl Strategy {
    /// Compose the full query: shape, filter, extra predicates, ordering and limit.
    fn build<F>(&self, filter: &CurationFilter, limit: i64, extra: F) -> QueryBuilder<'static, Postgres>
    where
        F: FnOnce(&mut Predicates<'_, 'static>),
    {
        let mut builder = QueryBuilder::<Postgres>::new(self.from);
        {
            let mut p = Predicates::new(&mut builder);
            apply_filter(&mut p, filter);

            if self.uses_timeframe {
                if let Some(timeframe) = filter.timeframe {
                    p.push(timeframe.created_after_clause());
                }
            }

            for &condition in self.conditions {
                p.push(condition);
            }

            extra(&mut p);
        }

        builder
            .push(" ORDER BY ")
            .push(self.order_by)
            .push(" LIMIT ")
            .push_bind(PageRequest::new(limit, 0).limit);
        builder
    }
}

/// PostgreSQL curation repository implementation.
#[derive(Clone)]
pub struct PgCurationRepository {
    pool: PgPool,
}

impl PgCurationRepository {
    /// Create a new PgCurationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run(
        &self,
        strategy: &Strategy,
        mut builder: QueryBuilder<'static, Postgres>,
    ) -> Result<Vec<Uuid>, AppError> {
        let started = Instant::now();

        let ids = builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query(strategy.name, "clips", started.elapsed().as_secs_f64());
        tracing::debug!(strategy = strategy.name, found = ids.len(), "Curation query finished");

        Ok(ids)
    }

    async fn simple(
        &self,
        strategy: &Strategy,
        filter: &CurationFilter,
        limit: i64,
    ) -> Result<Vec<Uuid>, AppError> {
        let builder = strategy.build(filter, limit, |_| {});
        self.run(strategy, builder).await
    }
}

#[async_trait]
impl CurationRepository for PgCurationRepository {
    async fn sleeper_hits(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&SLEEPER_HITS, filter, limit).await
    }

    async fn viral_velocity(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&VIRAL_VELOCITY, filter, limit).await
    }

    async fn community_favorites(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&COMMUNITY_FAVORITES, filter, limit).await
    }

    async fn deep_cuts(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&DEEP_CUTS, filter, limit).await
    }

    async fn fresh_faces(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&FRESH_FACES, filter, limit).await
    }

    async fn similar_vibes(
        &self,
        filter: &CurationFilter,
        seed_clip_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Uuid>, AppError> {
        let builder = SIMILAR_VIBES.build(filter, limit, |p| {
            p.eq("seed.id", seed_clip_id)
                .cmp("c.id", Comparison::NotEq, seed_clip_id);
        });
        self.run(&SIMILAR_VIBES, builder).await
    }

    async fn cross_game_hits(
        &self,
        filter: &CurationFilter,
        game_ids: &[String],
        limit: i64,
    ) -> Result<Vec<Uuid>, AppError> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }

        let games = game_ids.to_vec();
        let builder = CROSS_GAME_HITS.build(filter, limit, |p| {
            p.with(|b| {
                b.push("c.game_id = ANY(").push_bind(games).push(")");
            });
        });
        self.run(&CROSS_GAME_HITS, builder).await
    }

    async fn controversial(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&CONTROVERSIAL, filter, limit).await
    }

    async fn binge_worthy(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&BINGE_WORTHY, filter, limit).await
    }

    async fn rising_stars(&self, filter: &CurationFilter, limit: i64) -> Result<Vec<Uuid>, AppError> {
        self.simple(&RISING_STARS, filter, limit).await
    }
}
