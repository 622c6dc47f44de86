use std::sync::Arc;
use tracing::info;

use storage::repository::SessionRepository;

use crate::error::TrainingError;

/// Bounds history size by deleting the oldest sessions.
#[derive(Clone)]
pub struct RetentionService {
    sessions: Arc<dyn SessionRepository>,
}

impl RetentionService {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// Delete the `count` sessions with the earliest `started_at`, along with
    /// their selections and outcomes. Completed and open sessions are treated
    /// alike. Item progress is left untouched.
    ///
    /// Returns how many sessions were deleted.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Storage` on persistence failures.
    pub async fn prune_oldest(&self, count: u32) -> Result<u32, TrainingError> {
        if count == 0 {
            return Ok(0);
        }
        let deleted = self.sessions.delete_oldest_sessions(count).await?;
        info!(requested = count, deleted, "pruned oldest sessions");
        Ok(deleted)
    }
}
