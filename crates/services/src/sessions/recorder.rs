use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use storage::repository::{
    ItemRepository, ProgressUpdate, SessionRepository, StorageError, TrainingPersistence,
};
use vocab_core::model::{
    ItemId, NewSession, OutcomeRecord, ReviewMode, SelectedItem, Session, SessionId,
    TrainingResult,
};

use super::plan::{CandidatePools, SessionBuilder};
use super::progress::SessionProgress;
use crate::Clock;
use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::progress_tracker::ProgressTracker;

/// Result of answering a single item in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAnswerResult {
    pub outcome: OutcomeRecord,
    pub update: ProgressUpdate,
}

/// Starts sessions, records answers inside them, and completes them.
#[derive(Clone)]
pub struct SessionRecorder {
    clock: Clock,
    config: TrainingConfig,
    seed: Option<u64>,
    items: Arc<dyn ItemRepository>,
    sessions: Arc<dyn SessionRepository>,
    training: Arc<dyn TrainingPersistence>,
    tracker: ProgressTracker,
}

impl SessionRecorder {
    #[must_use]
    pub fn new(
        clock: Clock,
        items: Arc<dyn ItemRepository>,
        sessions: Arc<dyn SessionRepository>,
        training: Arc<dyn TrainingPersistence>,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            clock,
            config: TrainingConfig::default(),
            seed: None,
            items,
            sessions,
            training,
            tracker,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Fix the shuffle seed so selections are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Start a session: select items for `mode` and persist the header and selection.
    ///
    /// `length` defaults to the configured session length. An empty pool still
    /// produces a session with `total_words == 0`.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidArgument` for a zero or oversized length,
    /// or `TrainingError::Storage` on persistence failures.
    pub async fn start(
        &self,
        mode: ReviewMode,
        length: Option<u32>,
    ) -> Result<Session, TrainingError> {
        let target = self.config.resolve_length(length)?;
        let pools = self.load_pools(mode).await?;
        let available = pools.len();

        let target_len = usize::try_from(target).unwrap_or(usize::MAX);
        let plan = {
            let mut rng = self.rng();
            SessionBuilder::new(mode, target_len).build(pools, &mut rng)
        };

        let session = self
            .sessions
            .insert_session(&NewSession::new(mode, self.clock.now(), plan.items))
            .await?;
        info!(
            session = %session.id(),
            mode = %mode,
            requested = target,
            available,
            selected = session.total_words(),
            new = plan.new_selected,
            learning = plan.learning_selected,
            known = plan.known_selected,
            "session started"
        );
        Ok(session)
    }

    /// Record one answer: appends the outcome, counts it toward the session, and
    /// updates the item's progress in one unit.
    ///
    /// The item does not have to be part of the session's selection, and
    /// answering a completed session is accepted.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` or `TrainingError::ItemNotFound`
    /// for unknown IDs, or `TrainingError::Storage` on persistence failures.
    pub async fn record_result(
        &self,
        session_id: SessionId,
        item_id: ItemId,
        result: TrainingResult,
    ) -> Result<SessionAnswerResult, TrainingError> {
        self.require_session(session_id).await?;
        if self.items.find_item(item_id).await?.is_none() {
            return Err(TrainingError::ItemNotFound(item_id));
        }

        let recorded = self
            .training
            .record_result(
                session_id,
                item_id,
                result,
                self.clock.now(),
                self.tracker.thresholds(),
            )
            .await
            .map_err(|err| match err {
                // both were present a moment ago; a concurrent prune is the likely cause
                StorageError::NotFound => TrainingError::SessionNotFound(session_id),
                other => TrainingError::Storage(other),
            })?;

        debug!(session = %session_id, item = %item_id, %result, "result recorded");
        self.tracker.observe(item_id, result, &recorded.update);

        Ok(SessionAnswerResult {
            outcome: recorded.outcome,
            update: recorded.update,
        })
    }

    /// Stamp `completed_at` with the current time.
    ///
    /// Completing twice overwrites the earlier timestamp.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` for unknown IDs, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn complete(&self, session_id: SessionId) -> Result<Session, TrainingError> {
        let existing = self.require_session(session_id).await?;
        if let Some(previous) = existing.completed_at() {
            warn!(
                session = %session_id,
                %previous,
                "session already completed; overwriting completion time"
            );
        }

        let session = self
            .sessions
            .complete_session(session_id, self.clock.now())
            .await
            .map_err(|err| match err {
                StorageError::NotFound => TrainingError::SessionNotFound(session_id),
                other => TrainingError::Storage(other),
            })?;
        info!(
            session = %session_id,
            total = session.total_words(),
            correct = session.correct_answers(),
            "session completed"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` for unknown IDs, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn get_session(&self, session_id: SessionId) -> Result<Session, TrainingError> {
        self.require_session(session_id).await
    }

    /// The fixed selection of a session in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` for unknown IDs, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn selected_items(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<SelectedItem>, TrainingError> {
        self.require_session(session_id).await?;
        Ok(self.sessions.selected_items(session_id).await?)
    }

    /// Outcomes recorded in a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` for unknown IDs, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn outcomes(&self, session_id: SessionId) -> Result<Vec<OutcomeRecord>, TrainingError> {
        self.require_session(session_id).await?;
        Ok(self.sessions.outcomes(session_id).await?)
    }

    /// # Errors
    ///
    /// Returns `TrainingError::SessionNotFound` for unknown IDs, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn progress(&self, session_id: SessionId) -> Result<SessionProgress, TrainingError> {
        let session = self.require_session(session_id).await?;
        let selected = self.sessions.selected_items(session_id).await?;
        let outcomes = self.sessions.outcomes(session_id).await?;
        Ok(SessionProgress::from_parts(&session, &selected, &outcomes))
    }

    async fn require_session(&self, session_id: SessionId) -> Result<Session, TrainingError> {
        self.sessions
            .get_session(session_id)
            .await?
            .ok_or(TrainingError::SessionNotFound(session_id))
    }

    async fn load_pools(&self, mode: ReviewMode) -> Result<CandidatePools, StorageError> {
        let mut pools = CandidatePools::default();
        for level in mode.source_levels() {
            for item in self.items.list_by_mastery_level(*level).await? {
                pools.push(&item);
            }
        }
        Ok(pools)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}
