use std::sync::Arc;
use tracing::debug;

use storage::repository::SessionRepository;
use vocab_core::model::TrainingStats;

use crate::error::TrainingError;

/// Read-only aggregation over completed sessions.
#[derive(Clone)]
pub struct StatisticsService {
    sessions: Arc<dyn SessionRepository>,
    recent_limit: usize,
}

impl StatisticsService {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionRepository>, recent_limit: usize) -> Self {
        Self {
            sessions,
            recent_limit,
        }
    }

    /// Totals, accuracy overall and per review mode, and the most recent
    /// completed sessions. All zeros when nothing has been completed.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Storage` on persistence failures.
    pub async fn get_stats(&self) -> Result<TrainingStats, TrainingError> {
        let completed = self.sessions.completed_sessions().await?;
        let stats = TrainingStats::from_sessions(&completed, self.recent_limit);
        debug!(
            sessions = stats.total_sessions,
            words = stats.total_words_reviewed,
            accuracy = stats.average_accuracy,
            "statistics computed"
        );
        Ok(stats)
    }
}
