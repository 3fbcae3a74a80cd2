//! Application Startup
//!
//! Builds the connection pool and every repository from settings, and runs
//! the periodic maintenance pass.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::config::Settings;
use crate::domain::{
    CommunityRepository, CurationRepository, DmcaCounterNotice, DmcaRepository, MirrorRepository,
    PlaylistRepository, ReportRepository, ReputationRepository, RevenueRepository,
    StagingClipRepository, SubmissionRepository, VerificationRepository,
};
use crate::infrastructure::repositories::{
    PgCommunityRepository, PgCurationRepository, PgDmcaRepository, PgMirrorRepository,
    PgPlaylistRepository, PgReportRepository, PgReputationRepository, PgRevenueRepository,
    PgStagingClipRepository, PgSubmissionRepository, PgVerificationRepository,
};
use crate::infrastructure::{database, metrics};

/// Every repository, sharing one pool.
#[derive(Clone)]
pub struct Repositories {
    pub staging_clips: Arc<dyn StagingClipRepository>,
    pub curation: Arc<dyn CurationRepository>,
    pub communities: Arc<dyn CommunityRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub dmca: Arc<dyn DmcaRepository>,
    pub reputation: Arc<dyn ReputationRepository>,
    pub revenue: Arc<dyn RevenueRepository>,
    pub mirrors: Arc<dyn MirrorRepository>,
}

impl Repositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            staging_clips: Arc::new(PgStagingClipRepository::new(pool.clone())),
            curation: Arc::new(PgCurationRepository::new(pool.clone())),
            communities: Arc::new(PgCommunityRepository::new(pool.clone())),
            playlists: Arc::new(PgPlaylistRepository::new(pool.clone())),
            submissions: Arc::new(PgSubmissionRepository::new(pool.clone())),
            reports: Arc::new(PgReportRepository::new(pool.clone())),
            verifications: Arc::new(PgVerificationRepository::new(pool.clone())),
            dmca: Arc::new(PgDmcaRepository::new(pool.clone())),
            reputation: Arc::new(PgReputationRepository::new(pool.clone())),
            revenue: Arc::new(PgRevenueRepository::new(pool.clone())),
            mirrors: Arc::new(PgMirrorRepository::new(pool)),
        }
    }
}

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub strikes_expired: u64,
    pub mirrors_deleted: u64,
    pub counter_notices_awaiting_restore: usize,

    /// Popular clips still short of their mirror quota
    pub mirror_candidates: usize,
}

/// Application instance
pub struct Application {
    pool: PgPool,
    repositories: Repositories,
    settings: Arc<Settings>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let pool = database::create_pool(&settings.database).await?;
        database::ping(&pool).await?;
        tracing::info!(
            max_connections = settings.database.max_connections,
            "Database connection pool created"
        );

        Ok(Self::with_pool(pool, settings))
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: PgPool, settings: Settings) -> Self {
        let repositories = Repositories::new(pool.clone());
        Self {
            pool,
            repositories,
            settings: Arc::new(settings),
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Everything recorded so far, in Prometheus text format.
    pub fn metrics_snapshot(&self) -> String {
        metrics::gather_metrics()
    }

    /// Expire strikes, delete expired mirrors, list counter-notices whose
    /// waiting period has ended and find clips that need more mirrors. The
    /// tasks run concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn run_maintenance(&self) -> Result<MaintenanceReport> {
        let repos = &self.repositories;
        let mirror = &self.settings.mirror;

        let (strikes_expired, mirrors_deleted, awaiting, candidates) = futures::try_join!(
            repos.dmca.expire_old_strikes(),
            repos.mirrors.delete_expired(),
            repos.dmca.counter_notices_awaiting_restore(),
            repos.mirrors.popular_clips_for_mirroring(
                mirror.popularity_threshold,
                self.settings.listing.default_limit,
                mirror.max_active_per_clip,
            ),
        )?;

        for notice in &awaiting {
            log_restore_candidate(notice);
        }

        metrics::record_maintenance("strikes_expired", strikes_expired);
        metrics::record_maintenance("mirrors_deleted", mirrors_deleted);
        self.record_pool_stats();

        let report = MaintenanceReport {
            strikes_expired,
            mirrors_deleted,
            counter_notices_awaiting_restore: awaiting.len(),
            mirror_candidates: candidates.len(),
        };
        tracing::info!(?report, "Maintenance pass complete");

        Ok(report)
    }

    fn record_pool_stats(&self) {
        let idle = self.pool.num_idle() as u32;
        let size = self.pool.size();
        metrics::update_db_pool_stats(idle, size.saturating_sub(idle), self.settings.database.max_connections);
    }
}

fn log_restore_candidate(notice: &DmcaCounterNotice) {
    tracing::warn!(
        counter_notice_id = %notice.id,
        notice_id = %notice.dmca_notice_id,
        waiting_period_ends = ?notice.waiting_period_ends,
        "Counter-notice waiting period ended; content may be restored"
    );
}
