use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{ItemId, MasteryLevel, ModelError, SessionId};

//
// ─── REVIEW MODE ───────────────────────────────────────────────────────────────
//

/// Pool-selection strategy for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewMode {
    New,
    Learning,
    Known,
    Mixed,
}

impl ReviewMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewMode::New => "NEW",
            ReviewMode::Learning => "LEARNING",
            ReviewMode::Known => "KNOWN",
            ReviewMode::Mixed => "MIXED",
        }
    }

    /// Mastery levels whose items feed this mode's pool.
    ///
    /// `Mixed` draws from all of them, split into per-tier quotas by the session builder.
    #[must_use]
    pub fn source_levels(self) -> &'static [MasteryLevel] {
        match self {
            ReviewMode::New => &[MasteryLevel::New],
            ReviewMode::Learning => &[MasteryLevel::Learning],
            ReviewMode::Known => &[MasteryLevel::Known, MasteryLevel::Mastered],
            ReviewMode::Mixed => &MasteryLevel::ALL,
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "LEARNING" => Ok(Self::Learning),
            "KNOWN" => Ok(Self::Known),
            "MIXED" => Ok(Self::Mixed),
            _ => Err(ModelError::UnknownReviewMode(s.to_owned())),
        }
    }
}

//
// ─── SELECTED ITEM ─────────────────────────────────────────────────────────────
//

/// An item picked for a session together with its zero-based presentation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub item_id: ItemId,
    pub order: u32,
}

//
// ─── NEW SESSION ───────────────────────────────────────────────────────────────
//

/// A session that has been planned but not yet stored.
///
/// The item order here is the final presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    review_mode: ReviewMode,
    started_at: DateTime<Utc>,
    items: Vec<ItemId>,
}

impl NewSession {
    #[must_use]
    pub fn new(review_mode: ReviewMode, started_at: DateTime<Utc>, items: Vec<ItemId>) -> Self {
        Self {
            review_mode,
            started_at,
            items,
        }
    }

    #[must_use]
    pub fn review_mode(&self) -> ReviewMode {
        self.review_mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total_words(&self) -> u32 {
        u32::try_from(self.items.len()).unwrap_or(u32::MAX)
    }

    /// Selection with contiguous `order` values `0..total_words`.
    #[must_use]
    pub fn selected_items(&self) -> Vec<SelectedItem> {
        self.items
            .iter()
            .zip(0_u32..)
            .map(|(item_id, order)| SelectedItem {
                item_id: *item_id,
                order,
            })
            .collect()
    }

    #[must_use]
    pub fn assign_id(&self, id: SessionId) -> Session {
        Session {
            id,
            review_mode: self.review_mode,
            total_words: self.total_words(),
            correct_answers: 0,
            started_at: self.started_at,
            completed_at: None,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Header of one review run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    review_mode: ReviewMode,
    total_words: u32,
    correct_answers: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Rehydrate a session header from persisted storage.
    #[must_use]
    pub fn from_persisted(
        id: SessionId,
        review_mode: ReviewMode,
        total_words: u32,
        correct_answers: u32,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            review_mode,
            total_words,
            correct_answers,
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn review_mode(&self) -> ReviewMode {
        self.review_mode
    }

    #[must_use]
    pub fn total_words(&self) -> u32 {
        self.total_words
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn record_correct(&mut self) {
        self.correct_answers = self.correct_answers.saturating_add(1);
    }

    /// Stamp completion. A later call overwrites the earlier timestamp.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_session_orders_items_without_gaps() {
        let planned = NewSession::new(
            ReviewMode::Mixed,
            fixed_now(),
            vec![ItemId::new(9), ItemId::new(4), ItemId::new(7)],
        );
        let selected = planned.selected_items();
        let orders: Vec<u32> = selected.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(selected[0].item_id, ItemId::new(9));
        assert_eq!(planned.total_words(), 3);
    }

    #[test]
    fn assigned_session_starts_open_with_zero_correct() {
        let planned = NewSession::new(ReviewMode::New, fixed_now(), vec![ItemId::new(1)]);
        let session = planned.assign_id(SessionId::new(5));
        assert_eq!(session.id(), SessionId::new(5));
        assert_eq!(session.total_words(), 1);
        assert_eq!(session.correct_answers(), 0);
        assert!(!session.is_completed());
    }

    #[test]
    fn empty_plan_is_a_valid_session() {
        let planned = NewSession::new(ReviewMode::Learning, fixed_now(), Vec::new());
        assert!(planned.selected_items().is_empty());
        assert_eq!(planned.assign_id(SessionId::new(1)).total_words(), 0);
    }

    #[test]
    fn completing_twice_keeps_the_last_timestamp() {
        let mut session =
            NewSession::new(ReviewMode::New, fixed_now(), Vec::new()).assign_id(SessionId::new(1));
        let later = fixed_now() + chrono::Duration::minutes(3);
        session.complete(fixed_now());
        session.complete(later);
        assert_eq!(session.completed_at(), Some(later));
    }

    #[test]
    fn known_mode_reads_known_and_mastered() {
        assert_eq!(
            ReviewMode::Known.source_levels(),
            &[MasteryLevel::Known, MasteryLevel::Mastered]
        );
        assert_eq!("mixed".parse::<ReviewMode>().unwrap(), ReviewMode::Mixed);
    }
}
