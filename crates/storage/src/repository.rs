use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use vocab_core::mastery::MasteryThresholds;
use vocab_core::model::{
    Item, ItemId, MasteryChange, MasteryLevel, NewSession, OutcomeRecord, ProgressRecord,
    SelectedItem, Session, SessionId, TrainingResult,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Progress counters and level movement after one recorded result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: ProgressRecord,
    pub change: MasteryChange,
}

/// Everything written by one in-session result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub outcome: OutcomeRecord,
    pub update: ProgressUpdate,
}

/// Lookup side of the word-management collaborator.
///
/// The engine only writes `mastery_level`; `upsert_item` exists for seeding
/// and for the owning service.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist or update an item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError>;

    /// Fetch an item by ID, returning `None` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StorageError>;

    /// All items currently at `level`, in ID order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_by_mastery_level(&self, level: MasteryLevel) -> Result<Vec<Item>, StorageError>;
}

/// Session headers, their fixed selections, and their outcome logs.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a planned session and its selection in one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either part cannot be stored; nothing is kept in that case.
    async fn insert_session(&self, session: &NewSession) -> Result<Session, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError>;

    /// Selection of a session sorted by `order`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn selected_items(&self, id: SessionId) -> Result<Vec<SelectedItem>, StorageError>;

    /// Outcome log of a session sorted by `recorded_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn outcomes(&self, id: SessionId) -> Result<Vec<OutcomeRecord>, StorageError>;

    /// Set `completed_at`, overwriting any earlier value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<Session, StorageError>;

    /// Every session with a `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completed_sessions(&self) -> Result<Vec<Session>, StorageError>;

    /// Delete the `count` sessions with the earliest `started_at`, completed or not.
    ///
    /// Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_oldest_sessions(&self, count: u32) -> Result<u32, StorageError>;
}

/// Per-item progress counters.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(&self, item_id: ItemId) -> Result<Option<ProgressRecord>, StorageError>;

    /// Load-or-create the record, apply `result`, and write back counters and level.
    ///
    /// Runs as a single read-modify-write; concurrent calls for the same item are
    /// serialized so no increment is lost.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the item does not exist.
    async fn apply_result(
        &self,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<ProgressUpdate, StorageError>;
}

/// Atomic write path for an answer given inside a session.
#[async_trait]
pub trait TrainingPersistence: Send + Sync {
    /// Append the outcome, bump `correct_answers` on `Correct`, and apply the result to
    /// the item's progress, all in one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session or the item does not exist.
    async fn record_result(
        &self,
        session_id: SessionId,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<RecordedResult, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

struct SessionEntry {
    session: Session,
    selected: Vec<SelectedItem>,
    outcomes: Vec<OutcomeRecord>,
}

#[derive(Default)]
struct State {
    items: HashMap<ItemId, Item>,
    sessions: BTreeMap<SessionId, SessionEntry>,
    progress: HashMap<ItemId, ProgressRecord>,
    next_session_id: u64,
}

impl State {
    fn apply_progress(
        &mut self,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<ProgressUpdate, StorageError> {
        let item = self.items.get_mut(&item_id).ok_or(StorageError::NotFound)?;
        let mut progress = self
            .progress
            .get(&item_id)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::new(item_id, at));

        let change = progress.record(item.mastery_level(), result, at, thresholds);
        if change.changed() {
            *item = item.clone().with_mastery_level(change.current);
        }
        self.progress.insert(item_id, progress.clone());

        Ok(ProgressUpdate { progress, change })
    }
}

/// Simple in-memory repository for tests and prototyping.
///
/// One lock guards all state, so every trait method is a single atomic unit.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError> {
        self.lock()?.items.insert(item.id(), item.clone());
        Ok(())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StorageError> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    async fn list_by_mastery_level(&self, level: MasteryLevel) -> Result<Vec<Item>, StorageError> {
        let guard = self.lock()?;
        let mut items: Vec<Item> = guard
            .items
            .values()
            .filter(|item| item.mastery_level() == level)
            .cloned()
            .collect();
        items.sort_by_key(Item::id);
        Ok(items)
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &NewSession) -> Result<Session, StorageError> {
        let mut guard = self.lock()?;
        guard.next_session_id += 1;
        let stored = session.assign_id(SessionId::new(guard.next_session_id));
        guard.sessions.insert(
            stored.id(),
            SessionEntry {
                session: stored.clone(),
                selected: session.selected_items(),
                outcomes: Vec::new(),
            },
        );
        Ok(stored)
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        Ok(self.lock()?.sessions.get(&id).map(|e| e.session.clone()))
    }

    async fn selected_items(&self, id: SessionId) -> Result<Vec<SelectedItem>, StorageError> {
        let guard = self.lock()?;
        let mut selected = guard
            .sessions
            .get(&id)
            .map(|e| e.selected.clone())
            .unwrap_or_default();
        selected.sort_by_key(|s| s.order);
        Ok(selected)
    }

    async fn outcomes(&self, id: SessionId) -> Result<Vec<OutcomeRecord>, StorageError> {
        let guard = self.lock()?;
        let mut outcomes = guard
            .sessions
            .get(&id)
            .map(|e| e.outcomes.clone())
            .unwrap_or_default();
        outcomes.sort_by_key(|o| o.recorded_at);
        Ok(outcomes)
    }

    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        let mut guard = self.lock()?;
        let entry = guard.sessions.get_mut(&id).ok_or(StorageError::NotFound)?;
        entry.session.complete(completed_at);
        Ok(entry.session.clone())
    }

    async fn completed_sessions(&self) -> Result<Vec<Session>, StorageError> {
        Ok(self
            .lock()?
            .sessions
            .values()
            .filter(|e| e.session.is_completed())
            .map(|e| e.session.clone())
            .collect())
    }

    async fn delete_oldest_sessions(&self, count: u32) -> Result<u32, StorageError> {
        let mut guard = self.lock()?;
        let mut by_age: Vec<(DateTime<Utc>, SessionId)> = guard
            .sessions
            .values()
            .map(|e| (e.session.started_at(), e.session.id()))
            .collect();
        by_age.sort();

        let take = usize::try_from(count).unwrap_or(usize::MAX);
        let mut deleted = 0_u32;
        for (_, id) in by_age.into_iter().take(take) {
            if guard.sessions.remove(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, item_id: ItemId) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(self.lock()?.progress.get(&item_id).cloned())
    }

    async fn apply_result(
        &self,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<ProgressUpdate, StorageError> {
        self.lock()?.apply_progress(item_id, result, at, thresholds)
    }
}

#[async_trait]
impl TrainingPersistence for InMemoryRepository {
    async fn record_result(
        &self,
        session_id: SessionId,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<RecordedResult, StorageError> {
        let mut guard = self.lock()?;
        if !guard.sessions.contains_key(&session_id) || !guard.items.contains_key(&item_id) {
            return Err(StorageError::NotFound);
        }

        let update = guard.apply_progress(item_id, result, at, thresholds)?;
        let outcome = OutcomeRecord::new(session_id, item_id, result, at);

        let entry = guard
            .sessions
            .get_mut(&session_id)
            .ok_or(StorageError::NotFound)?;
        if result.is_correct() {
            entry.session.record_correct();
        }
        entry.outcomes.push(outcome.clone());

        Ok(RecordedResult { outcome, update })
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub items: Arc<dyn ItemRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub training: Arc<dyn TrainingPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Share one repository value across every role.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: ItemRepository
            + SessionRepository
            + ProgressRepository
            + TrainingPersistence
            + Clone
            + 'static,
    {
        Self {
            items: Arc::new(repo.clone()),
            sessions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            training: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vocab_core::time::fixed_now;

    fn item(id: u64, level: MasteryLevel) -> Item {
        Item::new(ItemId::new(id), format!("word-{id}"), level).unwrap()
    }

    #[tokio::test]
    async fn lists_items_by_level_in_id_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_item(&item(3, MasteryLevel::New)).await.unwrap();
        repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();
        repo.upsert_item(&item(2, MasteryLevel::Known)).await.unwrap();

        let new_items = repo.list_by_mastery_level(MasteryLevel::New).await.unwrap();
        let ids: Vec<u64> = new_items.iter().map(|i| i.id().value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn record_result_updates_session_progress_and_level() {
        let repo = InMemoryRepository::new();
        repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();
        let session = repo
            .insert_session(&NewSession::new(
                vocab_core::model::ReviewMode::New,
                fixed_now(),
                vec![ItemId::new(1)],
            ))
            .await
            .unwrap();

        for _ in 0..3 {
            repo.record_result(
                session.id(),
                ItemId::new(1),
                TrainingResult::Correct,
                fixed_now(),
                &MasteryThresholds::default(),
            )
            .await
            .unwrap();
        }

        let stored = repo.get_session(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.correct_answers(), 3);
        assert_eq!(repo.outcomes(session.id()).await.unwrap().len(), 3);
        let found = repo.find_item(ItemId::new(1)).await.unwrap().unwrap();
        assert_eq!(found.mastery_level(), MasteryLevel::Learning);
    }

    #[tokio::test]
    async fn record_result_for_missing_session_writes_nothing() {
        let repo = InMemoryRepository::new();
        repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();

        let err = repo
            .record_result(
                SessionId::new(99),
                ItemId::new(1),
                TrainingResult::Correct,
                fixed_now(),
                &MasteryThresholds::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound));
        assert!(repo.get_progress(ItemId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deletes_oldest_by_start_time() {
        let repo = InMemoryRepository::new();
        let base = fixed_now();
        // insert out of chronological order so ids and start times disagree
        for minutes in [30, 10, 50, 20, 40] {
            repo.insert_session(&NewSession::new(
                vocab_core::model::ReviewMode::Mixed,
                base + Duration::minutes(minutes),
                Vec::new(),
            ))
            .await
            .unwrap();
        }

        assert_eq!(repo.delete_oldest_sessions(3).await.unwrap(), 3);

        let mut remaining = Vec::new();
        for id in 1..=5 {
            if let Some(s) = repo.get_session(SessionId::new(id)).await.unwrap() {
                remaining.push(s.started_at());
            }
        }
        remaining.sort();
        assert_eq!(
            remaining,
            vec![base + Duration::minutes(40), base + Duration::minutes(50)]
        );
        assert_eq!(repo.delete_oldest_sessions(10).await.unwrap(), 2);
    }
}
