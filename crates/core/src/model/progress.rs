use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastery::MasteryThresholds;
use crate::model::{ItemId, MasteryLevel, ModelError, TrainingResult};

/// Level movement produced by recording one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryChange {
    pub previous: MasteryLevel,
    pub current: MasteryLevel,
}

impl MasteryChange {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Durable per-item counters that drive mastery transitions.
///
/// Invariants: `consecutive_correct <= total_correct <= total_attempts`.
/// `total_attempts` and `total_correct` never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    item_id: ItemId,
    total_attempts: u32,
    total_correct: u32,
    consecutive_correct: u32,
    last_reviewed_at: DateTime<Utc>,
    mastery_level_updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Fresh record for an item answered for the first time at `at`.
    #[must_use]
    pub fn new(item_id: ItemId, at: DateTime<Utc>) -> Self {
        Self {
            item_id,
            total_attempts: 0,
            total_correct: 0,
            consecutive_correct: 0,
            last_reviewed_at: at,
            mastery_level_updated_at: None,
        }
    }

    /// Rehydrate a progress record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::CorrectExceedsAttempts` or `ModelError::StreakExceedsCorrect`
    /// if the counters are inconsistent.
    pub fn from_persisted(
        item_id: ItemId,
        total_attempts: u32,
        total_correct: u32,
        consecutive_correct: u32,
        last_reviewed_at: DateTime<Utc>,
        mastery_level_updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ModelError> {
        if total_correct > total_attempts {
            return Err(ModelError::CorrectExceedsAttempts {
                correct: total_correct,
                attempts: total_attempts,
            });
        }
        if consecutive_correct > total_correct {
            return Err(ModelError::StreakExceedsCorrect {
                streak: consecutive_correct,
                correct: total_correct,
            });
        }
        Ok(Self {
            item_id,
            total_attempts,
            total_correct,
            consecutive_correct,
            last_reviewed_at,
            mastery_level_updated_at,
        })
    }

    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    #[must_use]
    pub fn last_reviewed_at(&self) -> DateTime<Utc> {
        self.last_reviewed_at
    }

    #[must_use]
    pub fn mastery_level_updated_at(&self) -> Option<DateTime<Utc>> {
        self.mastery_level_updated_at
    }

    /// Apply one answer to the counters and evaluate the ladder.
    ///
    /// Every answer counts as an attempt and moves `last_reviewed_at`. Then:
    ///
    /// - `Correct`: total and streak go up, then at most one promotion.
    /// - `Incorrect`: the streak resets. The level is kept.
    /// - `Skipped`: nothing else changes.
    ///
    /// `mastery_level_updated_at` is stamped only when the level actually changes.
    pub fn record(
        &mut self,
        current: MasteryLevel,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> MasteryChange {
        self.total_attempts = self.total_attempts.saturating_add(1);
        self.last_reviewed_at = at;

        let next = match result {
            TrainingResult::Correct => {
                self.total_correct = self.total_correct.saturating_add(1);
                self.consecutive_correct = self.consecutive_correct.saturating_add(1);
                thresholds.next_level(current, self.consecutive_correct, self.total_correct)
            }
            TrainingResult::Incorrect => {
                self.consecutive_correct = 0;
                current
            }
            TrainingResult::Skipped => current,
        };

        if next != current {
            self.mastery_level_updated_at = Some(at);
        }

        MasteryChange {
            previous: current,
            current: next,
        }
    }
}
