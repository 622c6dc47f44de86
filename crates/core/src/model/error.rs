use thiserror::Error;

/// Errors raised while building or rehydrating domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("item term cannot be empty")]
    EmptyTerm,

    #[error("unknown mastery level: {0}")]
    UnknownMasteryLevel(String),

    #[error("unknown review mode: {0}")]
    UnknownReviewMode(String),

    #[error("unknown training result: {0}")]
    UnknownTrainingResult(String),

    #[error("total correct ({correct}) exceeds total attempts ({attempts})")]
    CorrectExceedsAttempts { correct: u32, attempts: u32 },

    #[error("consecutive correct ({streak}) exceeds total correct ({correct})")]
    StreakExceedsCorrect { streak: u32, correct: u32 },
}
