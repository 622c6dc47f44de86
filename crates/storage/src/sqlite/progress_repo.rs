use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};
use vocab_core::mastery::MasteryThresholds;
use vocab_core::model::{ItemId, OutcomeRecord, ProgressRecord, SessionId, TrainingResult};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_progress_row, parse_mastery_level, ser};
use crate::repository::{
    ProgressRepository, ProgressUpdate, RecordedResult, StorageError, TrainingPersistence,
};

const PROGRESS_COLUMNS: &str = "item_id, total_attempts, total_correct, consecutive_correct, \
     last_reviewed_at, mastery_level_updated_at";

/// Read-modify-write of one item's progress and level.
///
/// The caller must already hold the database write lock (by issuing a write
/// earlier in the same transaction) so that the read below cannot go stale.
async fn apply_in_tx(
    db: &mut SqliteConnection,
    item_id: ItemId,
    result: TrainingResult,
    at: DateTime<Utc>,
    thresholds: &MasteryThresholds,
) -> Result<ProgressUpdate, StorageError> {
    let item_key = id_i64("item_id", item_id.value())?;

    let level_row = sqlx::query("SELECT mastery_level FROM items WHERE id = ?1")
        .bind(item_key)
        .fetch_optional(&mut *db)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;
    let level_tag: String = level_row.try_get("mastery_level").map_err(ser)?;
    let level = parse_mastery_level(&level_tag)?;

    let sql = format!("SELECT {PROGRESS_COLUMNS} FROM progress_records WHERE item_id = ?1");
    let existing = sqlx::query(&sql)
        .bind(item_key)
        .fetch_optional(&mut *db)
        .await
        .map_err(conn)?;

    let mut progress = match existing {
        Some(row) => map_progress_row(&row)?,
        None => ProgressRecord::new(item_id, at),
    };

    let change = progress.record(level, result, at, thresholds);

    sqlx::query(
        r"
        INSERT INTO progress_records (
            item_id, total_attempts, total_correct, consecutive_correct,
            last_reviewed_at, mastery_level_updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(item_id) DO UPDATE SET
            total_attempts = excluded.total_attempts,
            total_correct = excluded.total_correct,
            consecutive_correct = excluded.consecutive_correct,
            last_reviewed_at = excluded.last_reviewed_at,
            mastery_level_updated_at = excluded.mastery_level_updated_at
        ",
    )
    .bind(item_key)
    .bind(i64::from(progress.total_attempts()))
    .bind(i64::from(progress.total_correct()))
    .bind(i64::from(progress.consecutive_correct()))
    .bind(progress.last_reviewed_at())
    .bind(progress.mastery_level_updated_at())
    .execute(&mut *db)
    .await
    .map_err(conn)?;

    if change.changed() {
        sqlx::query("UPDATE items SET mastery_level = ?2 WHERE id = ?1")
            .bind(item_key)
            .bind(change.current.as_str())
            .execute(&mut *db)
            .await
            .map_err(conn)?;
    }

    Ok(ProgressUpdate { progress, change })
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, item_id: ItemId) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!("SELECT {PROGRESS_COLUMNS} FROM progress_records WHERE item_id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("item_id", item_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn apply_result(
        &self,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<ProgressUpdate, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // no-op write: takes the write lock before reading and doubles as the existence check
        let touched = sqlx::query("UPDATE items SET mastery_level = mastery_level WHERE id = ?1")
            .bind(id_i64("item_id", item_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        if touched.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let update = apply_in_tx(&mut *tx, item_id, result, at, thresholds).await?;
        tx.commit().await.map_err(conn)?;

        Ok(update)
    }
}

#[async_trait::async_trait]
impl TrainingPersistence for SqliteRepository {
    async fn record_result(
        &self,
        session_id: SessionId,
        item_id: ItemId,
        result: TrainingResult,
        at: DateTime<Utc>,
        thresholds: &MasteryThresholds,
    ) -> Result<RecordedResult, StorageError> {
        let session_key = id_i64("session_id", session_id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // the counter bump goes first so the transaction holds the write lock before any read
        let touched = sqlx::query(
            "UPDATE training_sessions SET correct_answers = correct_answers + ?2 WHERE id = ?1",
        )
        .bind(session_key)
        .bind(i64::from(result.is_correct()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        if touched.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let update = apply_in_tx(&mut *tx, item_id, result, at, thresholds).await?;

        sqlx::query(
            r"
                INSERT INTO outcome_records (session_id, item_id, result, recorded_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(session_key)
        .bind(id_i64("item_id", item_id.value())?)
        .bind(result.as_str())
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        Ok(RecordedResult {
            outcome: OutcomeRecord::new(session_id, item_id, result, at),
            update,
        })
    }
}
