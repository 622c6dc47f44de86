use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{ItemId, ModelError};

//
// ─── MASTERY LEVEL ─────────────────────────────────────────────────────────────
//

/// Position of an item on the learning ladder.
///
/// Variants are declared in ladder order, so `Ord` reflects progress:
/// `New < Learning < Known < Mastered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasteryLevel {
    New,
    Learning,
    Known,
    Mastered,
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 4] = [
        MasteryLevel::New,
        MasteryLevel::Learning,
        MasteryLevel::Known,
        MasteryLevel::Mastered,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MasteryLevel::New => "NEW",
            MasteryLevel::Learning => "LEARNING",
            MasteryLevel::Known => "KNOWN",
            MasteryLevel::Mastered => "MASTERED",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MasteryLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "LEARNING" => Ok(Self::Learning),
            "KNOWN" => Ok(Self::Known),
            "MASTERED" => Ok(Self::Mastered),
            _ => Err(ModelError::UnknownMasteryLevel(s.to_owned())),
        }
    }
}

//
// ─── ITEM ──────────────────────────────────────────────────────────────────────
//

/// A vocabulary item as seen by the training engine.
///
/// Items are owned by the word-management side; the engine reads them and only
/// ever writes back `mastery_level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    term: String,
    mastery_level: MasteryLevel,
}

impl Item {
    /// # Errors
    ///
    /// Returns `ModelError::EmptyTerm` if `term` is blank.
    pub fn new(
        id: ItemId,
        term: impl Into<String>,
        mastery_level: MasteryLevel,
    ) -> Result<Self, ModelError> {
        let term = term.into();
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyTerm);
        }
        Ok(Self {
            id,
            term: trimmed.to_owned(),
            mastery_level,
        })
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn mastery_level(&self) -> MasteryLevel {
        self.mastery_level
    }

    /// Same item at another rung. Used when persisting a mastery transition.
    #[must_use]
    pub fn with_mastery_level(mut self, level: MasteryLevel) -> Self {
        self.mastery_level = level;
        self
    }
}
