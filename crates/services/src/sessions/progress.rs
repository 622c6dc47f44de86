use serde::Serialize;
use std::collections::HashSet;

use vocab_core::model::{OutcomeRecord, SelectedItem, Session};

/// Aggregated view of how far a session has got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    /// Selected items with at least one recorded outcome.
    pub answered: usize,
    pub remaining: usize,
    pub correct: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn from_parts(
        session: &Session,
        selected: &[SelectedItem],
        outcomes: &[OutcomeRecord],
    ) -> Self {
        let seen: HashSet<_> = outcomes.iter().map(|o| o.item_id).collect();
        let answered = selected
            .iter()
            .filter(|s| seen.contains(&s.item_id))
            .count();
        Self {
            total: selected.len(),
            answered,
            remaining: selected.len() - answered,
            correct: session.correct_answers(),
            is_complete: session.is_completed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::model::{ItemId, NewSession, ReviewMode, SessionId, TrainingResult};
    use vocab_core::time::fixed_now;

    #[test]
    fn counts_selected_items_answered_once() {
        let planned = NewSession::new(
            ReviewMode::New,
            fixed_now(),
            vec![ItemId::new(1), ItemId::new(2), ItemId::new(3)],
        );
        let session = planned.assign_id(SessionId::new(1));
        let outcome = |item: u64| {
            OutcomeRecord::new(
                session.id(),
                ItemId::new(item),
                TrainingResult::Incorrect,
                fixed_now(),
            )
        };
        // item 9 is outside the selection and item 1 was answered twice
        let outcomes = vec![outcome(1), outcome(1), outcome(9)];

        let progress = SessionProgress::from_parts(&session, &planned.selected_items(), &outcomes);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.correct, 0);
        assert!(!progress.is_complete);
    }
}
