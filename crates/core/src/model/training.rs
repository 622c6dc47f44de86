use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{ItemId, ModelError, SessionId};

//
// ─── TRAINING RESULT ──────────────────────────────────────────────────────────
//

/// Outcome submitted for one answered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingResult {
    /// Answered correctly. Extends the streak and may promote the item.
    Correct,
    /// Answered wrongly. Resets the streak, never demotes.
    Incorrect,
    /// Not answered. Leaves every counter untouched.
    Skipped,
}

impl TrainingResult {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingResult::Correct => "CORRECT",
            TrainingResult::Incorrect => "INCORRECT",
            TrainingResult::Skipped => "SKIPPED",
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, TrainingResult::Correct)
    }
}

impl fmt::Display for TrainingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingResult {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CORRECT" => Ok(Self::Correct),
            "INCORRECT" => Ok(Self::Incorrect),
            "SKIPPED" => Ok(Self::Skipped),
            _ => Err(ModelError::UnknownTrainingResult(s.to_owned())),
        }
    }
}

//
// ─── OUTCOME RECORD ───────────────────────────────────────────────────────────
//

/// One submitted answer within a session.
///
/// Append-only. The same item may be answered more than once per session,
/// and the item is not required to be part of the session's selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub session_id: SessionId,
    pub item_id: ItemId,
    pub result: TrainingResult,
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeRecord {
    #[must_use]
    pub fn new(
        session_id: SessionId,
        item_id: ItemId,
        result: TrainingResult,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            item_id,
            result,
            recorded_at,
        }
    }
}
