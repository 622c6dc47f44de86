use std::sync::Arc;

use storage::repository::{ItemRepository, Storage};
use vocab_core::mastery::MasteryThresholds;

use crate::Clock;
use crate::config::TrainingConfig;
use crate::error::ServicesInitError;
use crate::progress_tracker::ProgressTracker;
use crate::retention::RetentionService;
use crate::sessions::SessionRecorder;
use crate::stats_service::StatisticsService;

/// Assembles the training services over one `Storage`.
#[derive(Clone)]
pub struct TrainingServices {
    items: Arc<dyn ItemRepository>,
    recorder: Arc<SessionRecorder>,
    tracker: Arc<ProgressTracker>,
    stats: Arc<StatisticsService>,
    retention: Arc<RetentionService>,
}

impl TrainingServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, config: TrainingConfig) -> Self {
        Self::with_thresholds(storage, clock, config, MasteryThresholds::default(), None)
    }

    /// Like [`TrainingServices::new`] with explicit mastery thresholds and an
    /// optional fixed shuffle seed.
    #[must_use]
    pub fn with_thresholds(
        storage: &Storage,
        clock: Clock,
        config: TrainingConfig,
        thresholds: MasteryThresholds,
        seed: Option<u64>,
    ) -> Self {
        let tracker =
            ProgressTracker::new(clock, Arc::clone(&storage.progress)).with_thresholds(thresholds);
        let mut recorder = SessionRecorder::new(
            clock,
            Arc::clone(&storage.items),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.training),
            tracker.clone(),
        )
        .with_config(config);
        if let Some(seed) = seed {
            recorder = recorder.with_seed(seed);
        }
        let stats = StatisticsService::new(
            Arc::clone(&storage.sessions),
            config.recent_sessions_limit(),
        );
        let retention = RetentionService::new(Arc::clone(&storage.sessions));

        Self {
            items: Arc::clone(&storage.items),
            recorder: Arc::new(recorder),
            tracker: Arc::new(tracker),
            stats: Arc::new(stats),
            retention: Arc::new(retention),
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `ServicesInitError` if connecting or migrating fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: TrainingConfig,
    ) -> Result<Self, ServicesInitError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, config))
    }

    /// Item lookup, used for seeding and listing words.
    #[must_use]
    pub fn items(&self) -> Arc<dyn ItemRepository> {
        Arc::clone(&self.items)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<SessionRecorder> {
        Arc::clone(&self.recorder)
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn retention(&self) -> Arc<RetentionService> {
        Arc::clone(&self.retention)
    }
}
