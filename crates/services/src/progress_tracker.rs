use std::sync::Arc;
use tracing::debug;

use storage::repository::{ProgressRepository, ProgressUpdate, StorageError};
use vocab_core::mastery::MasteryThresholds;
use vocab_core::model::{ItemId, ProgressRecord, TrainingResult};

use crate::Clock;
use crate::error::TrainingError;

/// Applies results to per-item progress and drives the mastery ladder.
#[derive(Clone)]
pub struct ProgressTracker {
    clock: Clock,
    thresholds: MasteryThresholds,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            thresholds: MasteryThresholds::default(),
            progress,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: MasteryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn thresholds(&self) -> &MasteryThresholds {
        &self.thresholds
    }

    /// Record one outcome for `item_id` outside of any session.
    ///
    /// Creates the progress record on first sight and moves the item at most
    /// one level up.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::ItemNotFound` if the item does not exist, or
    /// `TrainingError::Storage` on persistence failures.
    pub async fn record_outcome(
        &self,
        item_id: ItemId,
        result: TrainingResult,
    ) -> Result<ProgressRecord, TrainingError> {
        let at = self.clock.now();
        let update = self
            .progress
            .apply_result(item_id, result, at, &self.thresholds)
            .await
            .map_err(|err| match err {
                StorageError::NotFound => TrainingError::ItemNotFound(item_id),
                other => TrainingError::Storage(other),
            })?;
        self.observe(item_id, result, &update);
        Ok(update.progress)
    }

    /// Current progress of an item, `None` if it was never reviewed.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Storage` on persistence failures.
    pub async fn progress(&self, item_id: ItemId) -> Result<Option<ProgressRecord>, TrainingError> {
        Ok(self.progress.get_progress(item_id).await?)
    }

    pub(crate) fn observe(&self, item_id: ItemId, result: TrainingResult, update: &ProgressUpdate) {
        debug!(
            item = %item_id,
            %result,
            attempts = update.progress.total_attempts(),
            correct = update.progress.total_correct(),
            streak = update.progress.consecutive_correct(),
            "progress updated"
        );
        if update.change.changed() {
            debug!(
                item = %item_id,
                from = %update.change.previous,
                to = %update.change.current,
                "mastery level changed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, ItemRepository};
    use vocab_core::model::{Item, MasteryLevel};
    use vocab_core::time::fixed_clock;

    async fn tracker_with_item(level: MasteryLevel) -> (ProgressTracker, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        repo.upsert_item(&Item::new(ItemId::new(1), "casa", level).unwrap())
            .await
            .unwrap();
        let tracker = ProgressTracker::new(fixed_clock(), Arc::new(repo.clone()));
        (tracker, repo)
    }

    #[tokio::test]
    async fn first_outcome_creates_record() {
        let (tracker, _repo) = tracker_with_item(MasteryLevel::New).await;
        assert!(tracker.progress(ItemId::new(1)).await.unwrap().is_none());

        let record = tracker
            .record_outcome(ItemId::new(1), TrainingResult::Correct)
            .await
            .unwrap();
        assert_eq!(record.total_attempts(), 1);
        assert_eq!(record.total_correct(), 1);
        assert_eq!(record.consecutive_correct(), 1);
        assert_eq!(tracker.progress(ItemId::new(1)).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn third_correct_promotes_new_to_learning() {
        let (tracker, repo) = tracker_with_item(MasteryLevel::New).await;
        for _ in 0..3 {
            tracker
                .record_outcome(ItemId::new(1), TrainingResult::Correct)
                .await
                .unwrap();
        }
        let item = repo.find_item(ItemId::new(1)).await.unwrap().unwrap();
        assert_eq!(item.mastery_level(), MasteryLevel::Learning);
    }

    #[tokio::test]
    async fn custom_thresholds_apply() {
        let (tracker, repo) = tracker_with_item(MasteryLevel::New).await;
        let tracker = tracker.with_thresholds(MasteryThresholds {
            learning_streak: 1,
            ..MasteryThresholds::default()
        });
        tracker
            .record_outcome(ItemId::new(1), TrainingResult::Correct)
            .await
            .unwrap();
        let item = repo.find_item(ItemId::new(1)).await.unwrap().unwrap();
        assert_eq!(item.mastery_level(), MasteryLevel::Learning);
    }

    #[tokio::test]
    async fn unknown_item_is_reported() {
        let (tracker, _repo) = tracker_with_item(MasteryLevel::New).await;
        let err = tracker
            .record_outcome(ItemId::new(99), TrainingResult::Incorrect)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainingError::ItemNotFound(id) if id == ItemId::new(99)));
    }
}
