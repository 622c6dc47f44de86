//! Threshold-based mastery ladder.
//!
//! An item climbs `New → Learning → Known → Mastered`, one rung per correct
//! answer at most, and never climbs back down:
//!
//! | level      | promotes when               | to         |
//! |------------|-----------------------------|------------|
//! | `New`      | consecutive correct ≥ 3     | `Learning` |
//! | `Learning` | total correct ≥ 10          | `Known`    |
//! | `Known`    | total correct ≥ 15          | `Mastered` |
//! | `Mastered` | never                       | `Mastered` |
//!
//! The functions here are pure; persistence applies them through
//! [`ProgressRecord::record`](crate::model::ProgressRecord::record).

use serde::{Deserialize, Serialize};

use crate::model::MasteryLevel;

/// Promotion thresholds for each rung of the ladder.
///
/// # Examples
///
/// ```
/// # use vocab_core::mastery::MasteryThresholds;
/// # use vocab_core::model::MasteryLevel;
/// let thresholds = MasteryThresholds::default();
/// assert_eq!(thresholds.next_level(MasteryLevel::New, 3, 3), MasteryLevel::Learning);
/// assert_eq!(thresholds.next_level(MasteryLevel::New, 2, 40), MasteryLevel::New);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryThresholds {
    /// Consecutive correct answers that move `New` to `Learning`.
    pub learning_streak: u32,
    /// Lifetime correct answers that move `Learning` to `Known`.
    pub known_total: u32,
    /// Lifetime correct answers that move `Known` to `Mastered`.
    pub mastered_total: u32,
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            learning_streak: 3,
            known_total: 10,
            mastered_total: 15,
        }
    }
}

impl MasteryThresholds {
    /// Level after a correct answer, given the counters already incremented.
    ///
    /// Moves at most one rung and never returns a level below `current`.
    #[must_use]
    pub fn next_level(
        &self,
        current: MasteryLevel,
        consecutive_correct: u32,
        total_correct: u32,
    ) -> MasteryLevel {
        match current {
            MasteryLevel::New if consecutive_correct >= self.learning_streak => {
                MasteryLevel::Learning
            }
            MasteryLevel::Learning if total_correct >= self.known_total => MasteryLevel::Known,
            MasteryLevel::Known if total_correct >= self.mastered_total => MasteryLevel::Mastered,
            other => other,
        }
    }
}

/// [`MasteryThresholds::next_level`] with the default thresholds.
#[must_use]
pub fn next_level(
    current: MasteryLevel,
    consecutive_correct: u32,
    total_correct: u32,
) -> MasteryLevel {
    MasteryThresholds::default().next_level(current, consecutive_correct, total_correct)
}
