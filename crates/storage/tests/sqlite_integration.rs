use chrono::Duration;
use std::sync::Arc;
use storage::repository::{
    ItemRepository, ProgressRepository, SessionRepository, Storage, StorageError,
    TrainingPersistence,
};
use storage::sqlite::SqliteRepository;
use vocab_core::mastery::MasteryThresholds;
use vocab_core::model::{
    Item, ItemId, MasteryLevel, NewSession, ReviewMode, SessionId, TrainingResult,
};
use vocab_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn item(id: u64, level: MasteryLevel) -> Item {
    Item::new(ItemId::new(id), format!("word-{id}"), level).unwrap()
}

#[tokio::test]
async fn sqlite_items_round_trip_and_filter_by_level() {
    let repo = connect("memdb_items").await;
    repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();
    repo.upsert_item(&item(2, MasteryLevel::Known)).await.unwrap();
    repo.upsert_item(&item(3, MasteryLevel::Mastered)).await.unwrap();

    let found = repo.find_item(ItemId::new(2)).await.unwrap().unwrap();
    assert_eq!(found.term(), "word-2");
    assert_eq!(found.mastery_level(), MasteryLevel::Known);
    assert!(repo.find_item(ItemId::new(42)).await.unwrap().is_none());

    let mastered = repo
        .list_by_mastery_level(MasteryLevel::Mastered)
        .await
        .unwrap();
    assert_eq!(mastered.len(), 1);
    assert_eq!(mastered[0].id(), ItemId::new(3));
}

#[tokio::test]
async fn sqlite_session_persists_selection_in_order() {
    let repo = connect("memdb_session_order").await;
    for id in 1..=3 {
        repo.upsert_item(&item(id, MasteryLevel::New)).await.unwrap();
    }

    let planned = NewSession::new(
        ReviewMode::New,
        fixed_now(),
        vec![ItemId::new(3), ItemId::new(1), ItemId::new(2)],
    );
    let session = repo.insert_session(&planned).await.unwrap();
    assert_eq!(session.total_words(), 3);
    assert_eq!(session.completed_at(), None);

    let selected = repo.selected_items(session.id()).await.unwrap();
    let ids: Vec<u64> = selected.iter().map(|s| s.item_id.value()).collect();
    let orders: Vec<u32> = selected.iter().map(|s| s.order).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(orders, vec![0, 1, 2]);

    let fetched = repo.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(fetched, session);
}

#[tokio::test]
async fn sqlite_record_result_is_one_unit() {
    let repo = connect("memdb_record_result").await;
    repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();
    let session = repo
        .insert_session(&NewSession::new(
            ReviewMode::New,
            fixed_now(),
            vec![ItemId::new(1)],
        ))
        .await
        .unwrap();
    let thresholds = MasteryThresholds::default();

    let mut last = None;
    for step in 0..3 {
        let at = fixed_now() + Duration::seconds(step);
        last = Some(
            repo.record_result(
                session.id(),
                ItemId::new(1),
                TrainingResult::Correct,
                at,
                &thresholds,
            )
            .await
            .unwrap(),
        );
    }
    let last = last.unwrap();
    assert_eq!(last.update.change.current, MasteryLevel::Learning);
    assert_eq!(last.update.progress.consecutive_correct(), 3);

    let stored = repo.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(stored.correct_answers(), 3);

    let item = repo.find_item(ItemId::new(1)).await.unwrap().unwrap();
    assert_eq!(item.mastery_level(), MasteryLevel::Learning);

    let progress = repo.get_progress(ItemId::new(1)).await.unwrap().unwrap();
    assert_eq!(progress.total_attempts(), 3);
    assert_eq!(
        progress.mastery_level_updated_at(),
        Some(fixed_now() + Duration::seconds(2))
    );

    let outcomes = repo.outcomes(session.id()).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.result == TrainingResult::Correct));
}

#[tokio::test]
async fn sqlite_record_result_rolls_back_for_missing_item() {
    let repo = connect("memdb_record_missing_item").await;
    let session = repo
        .insert_session(&NewSession::new(ReviewMode::Mixed, fixed_now(), Vec::new()))
        .await
        .unwrap();

    let err = repo
        .record_result(
            session.id(),
            ItemId::new(77),
            TrainingResult::Correct,
            fixed_now(),
            &MasteryThresholds::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    // the correct_answers bump was rolled back with the rest
    let stored = repo.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(stored.correct_answers(), 0);
    assert!(repo.outcomes(session.id()).await.unwrap().is_empty());

    let err = repo
        .record_result(
            SessionId::new(999),
            ItemId::new(77),
            TrainingResult::Skipped,
            fixed_now(),
            &MasteryThresholds::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_apply_result_without_session() {
    let repo = connect("memdb_apply_result").await;
    repo.upsert_item(&item(5, MasteryLevel::Learning)).await.unwrap();

    let update = repo
        .apply_result(
            ItemId::new(5),
            TrainingResult::Incorrect,
            fixed_now(),
            &MasteryThresholds::default(),
        )
        .await
        .unwrap();
    assert_eq!(update.progress.total_attempts(), 1);
    assert_eq!(update.progress.total_correct(), 0);
    assert_eq!(update.change.current, MasteryLevel::Learning);

    let err = repo
        .apply_result(
            ItemId::new(6),
            TrainingResult::Correct,
            fixed_now(),
            &MasteryThresholds::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_complete_overwrites_and_lists_completed() {
    let repo = connect("memdb_complete").await;
    let open = repo
        .insert_session(&NewSession::new(ReviewMode::New, fixed_now(), Vec::new()))
        .await
        .unwrap();
    let done = repo
        .insert_session(&NewSession::new(ReviewMode::Known, fixed_now(), Vec::new()))
        .await
        .unwrap();

    let first = fixed_now() + Duration::minutes(1);
    let second = fixed_now() + Duration::minutes(9);
    repo.complete_session(done.id(), first).await.unwrap();
    let recompleted = repo.complete_session(done.id(), second).await.unwrap();
    assert_eq!(recompleted.completed_at(), Some(second));

    let completed = repo.completed_sessions().await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id(), done.id());
    assert_ne!(completed[0].id(), open.id());

    let err = repo
        .complete_session(SessionId::new(12345), second)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_prune_deletes_oldest_with_children() {
    let repo = connect("memdb_prune").await;
    repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();

    let base = fixed_now();
    let mut ids = Vec::new();
    for minutes in [40, 10, 30, 50, 20] {
        let session = repo
            .insert_session(&NewSession::new(
                ReviewMode::New,
                base + Duration::minutes(minutes),
                vec![ItemId::new(1)],
            ))
            .await
            .unwrap();
        repo.record_result(
            session.id(),
            ItemId::new(1),
            TrainingResult::Skipped,
            base,
            &MasteryThresholds::default(),
        )
        .await
        .unwrap();
        ids.push((minutes, session.id()));
    }

    assert_eq!(repo.delete_oldest_sessions(3).await.unwrap(), 3);

    for (minutes, id) in ids {
        let exists = repo.get_session(id).await.unwrap().is_some();
        assert_eq!(exists, minutes > 30, "session started at +{minutes}m");
        if !exists {
            assert!(repo.selected_items(id).await.unwrap().is_empty());
            assert!(repo.outcomes(id).await.unwrap().is_empty());
        }
    }

    assert_eq!(repo.delete_oldest_sessions(10).await.unwrap(), 2);
    assert_eq!(repo.delete_oldest_sessions(1).await.unwrap(), 0);
}

#[tokio::test]
async fn sqlite_concurrent_results_lose_no_updates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("race.sqlite3").display());
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo.upsert_item(&item(1, MasteryLevel::New)).await.unwrap();
    let session = repo
        .insert_session(&NewSession::new(
            ReviewMode::New,
            fixed_now(),
            vec![ItemId::new(1)],
        ))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        let session_id = session.id();
        handles.push(tokio::spawn(async move {
            repo.record_result(
                session_id,
                ItemId::new(1),
                TrainingResult::Correct,
                fixed_now(),
                &MasteryThresholds::default(),
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("record");
    }

    let progress = repo.get_progress(ItemId::new(1)).await.unwrap().unwrap();
    assert_eq!(progress.total_attempts(), 8);
    assert_eq!(progress.total_correct(), 8);
    assert_eq!(progress.consecutive_correct(), 8);

    let stored = repo.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(stored.correct_answers(), 8);
    let item = repo.find_item(ItemId::new(1)).await.unwrap().unwrap();
    assert_eq!(item.mastery_level(), MasteryLevel::Learning);
}

#[tokio::test]
async fn sqlite_private_memory_db_is_shared_by_every_query() {
    let storage = Storage::sqlite("sqlite::memory:").await.expect("open");
    for id in 1..=4 {
        storage
            .items
            .upsert_item(&item(id, MasteryLevel::New))
            .await
            .unwrap();
    }

    // concurrent queries must all land on the migrated database
    let mut handles = Vec::new();
    for _ in 0..8 {
        let items = Arc::clone(&storage.items);
        handles.push(tokio::spawn(async move {
            items.list_by_mastery_level(MasteryLevel::New).await
        }));
    }
    for handle in handles {
        let listed = handle.await.expect("join").expect("list");
        assert_eq!(listed.len(), 4);
    }

    let session = storage
        .sessions
        .insert_session(&NewSession::new(
            ReviewMode::New,
            fixed_now(),
            vec![ItemId::new(1), ItemId::new(2)],
        ))
        .await
        .unwrap();
    let selected = storage.sessions.selected_items(session.id()).await.unwrap();
    assert_eq!(selected.len(), 2);
}
