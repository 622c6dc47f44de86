use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ReviewMode, Session};

/// Aggregate review statistics over completed sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub total_sessions: u32,
    pub total_words_reviewed: u64,
    /// Percentage in `0.0..=100.0` for in-session answers; `0.0` when nothing was reviewed.
    pub average_accuracy: f64,
    /// Most recently completed sessions, newest first.
    pub recent_sessions: Vec<Session>,
    pub accuracy_by_review_mode: BTreeMap<ReviewMode, f64>,
}

#[derive(Default)]
struct Totals {
    words: u64,
    correct: u64,
}

impl Totals {
    fn add(&mut self, session: &Session) {
        self.words += u64::from(session.total_words());
        self.correct += u64::from(session.correct_answers());
    }

    #[allow(clippy::cast_precision_loss)]
    fn accuracy(&self) -> f64 {
        if self.words == 0 {
            0.0
        } else {
            self.correct as f64 / self.words as f64 * 100.0
        }
    }
}

impl TrainingStats {
    /// Build statistics from a set of sessions.
    ///
    /// Sessions without `completed_at` are ignored. `recent_limit` bounds
    /// `recent_sessions`.
    #[must_use]
    pub fn from_sessions(sessions: &[Session], recent_limit: usize) -> Self {
        let mut completed: Vec<&Session> = sessions.iter().filter(|s| s.is_completed()).collect();

        let mut overall = Totals::default();
        let mut by_mode: BTreeMap<ReviewMode, Totals> = BTreeMap::new();
        for session in &completed {
            overall.add(session);
            by_mode.entry(session.review_mode()).or_default().add(session);
        }

        completed.sort_by(|a, b| {
            b.completed_at()
                .cmp(&a.completed_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        Self {
            total_sessions: u32::try_from(completed.len()).unwrap_or(u32::MAX),
            total_words_reviewed: overall.words,
            average_accuracy: overall.accuracy(),
            recent_sessions: completed
                .into_iter()
                .take(recent_limit)
                .cloned()
                .collect(),
            accuracy_by_review_mode: by_mode
                .into_iter()
                .map(|(mode, totals)| (mode, totals.accuracy()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn completed(id: u64, mode: ReviewMode, words: u32, correct: u32, minutes: i64) -> Session {
        let started = fixed_now();
        Session::from_persisted(
            SessionId::new(id),
            mode,
            words,
            correct,
            started,
            Some(started + Duration::minutes(minutes)),
        )
    }

    #[test]
    fn empty_history_reports_zero_accuracy() {
        let stats = TrainingStats::from_sessions(&[], 10);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_words_reviewed, 0);
        assert!(stats.average_accuracy.abs() < f64::EPSILON);
        assert!(stats.recent_sessions.is_empty());
        assert!(stats.accuracy_by_review_mode.is_empty());
    }

    #[test]
    fn aggregates_overall_and_per_mode() {
        let sessions = vec![
            completed(1, ReviewMode::Mixed, 10, 8, 5),
            completed(2, ReviewMode::New, 5, 5, 10),
        ];
        let stats = TrainingStats::from_sessions(&sessions, 10);

        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_words_reviewed, 15);
        assert!((stats.average_accuracy - 86.666_666).abs() < 0.001);
        assert!((stats.accuracy_by_review_mode[&ReviewMode::Mixed] - 80.0).abs() < 1e-9);
        assert!((stats.accuracy_by_review_mode[&ReviewMode::New] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ignores_open_sessions() {
        let open = Session::from_persisted(
            SessionId::new(3),
            ReviewMode::Known,
            20,
            20,
            fixed_now(),
            None,
        );
        let stats = TrainingStats::from_sessions(&[open, completed(1, ReviewMode::New, 4, 1, 1)], 10);
        assert_eq!(stats.total_sessions, 1);
        assert!((stats.average_accuracy - 25.0).abs() < 1e-9);
        assert!(!stats.accuracy_by_review_mode.contains_key(&ReviewMode::Known));
    }

    #[test]
    fn zero_word_mode_has_zero_accuracy() {
        let stats = TrainingStats::from_sessions(&[completed(1, ReviewMode::Learning, 0, 0, 1)], 10);
        assert_eq!(stats.total_sessions, 1);
        assert!(stats.accuracy_by_review_mode[&ReviewMode::Learning].abs() < f64::EPSILON);
    }

    #[test]
    fn recent_sessions_are_newest_first_and_bounded() {
        let sessions: Vec<Session> = (1..=12)
            .map(|i| completed(i, ReviewMode::Mixed, 1, 1, i64::try_from(i).unwrap()))
            .collect();
        let stats = TrainingStats::from_sessions(&sessions, 10);

        assert_eq!(stats.recent_sessions.len(), 10);
        assert_eq!(stats.recent_sessions[0].id(), SessionId::new(12));
        assert_eq!(stats.recent_sessions[9].id(), SessionId::new(3));
    }
}
