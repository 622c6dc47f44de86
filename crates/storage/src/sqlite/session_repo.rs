use chrono::{DateTime, Utc};
use vocab_core::model::{NewSession, OutcomeRecord, SelectedItem, Session, SessionId};

use super::SqliteRepository;
use super::mapping::{
    conn, id_i64, map_outcome_row, map_selected_row, map_session_row, session_id_from_i64,
};
use crate::repository::{SessionRepository, StorageError};

const SESSION_COLUMNS: &str =
    "id, review_mode, total_words, correct_answers, started_at, completed_at";

impl SqliteRepository {
    async fn fetch_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM training_sessions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("session_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_session_row).transpose()
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &NewSession) -> Result<Session, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO training_sessions (
                    review_mode, total_words, correct_answers, started_at, completed_at
                )
                VALUES (?1, ?2, 0, ?3, NULL)
            ",
        )
        .bind(session.review_mode().as_str())
        .bind(i64::from(session.total_words()))
        .bind(session.started_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let session_id = session_id_from_i64(res.last_insert_rowid())?;
        let session_key = id_i64("session_id", session_id.value())?;

        for selected in session.selected_items() {
            sqlx::query(
                r"
                    INSERT INTO session_items (session_id, item_id, item_order)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(session_key)
            .bind(id_i64("item_id", selected.item_id.value())?)
            .bind(i64::from(selected.order))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;

        Ok(session.assign_id(session_id))
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        self.fetch_session(id).await
    }

    async fn selected_items(&self, id: SessionId) -> Result<Vec<SelectedItem>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT item_id, item_order
                FROM session_items
                WHERE session_id = ?1
                ORDER BY item_order ASC
            ",
        )
        .bind(id_i64("session_id", id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_selected_row).collect()
    }

    async fn outcomes(&self, id: SessionId) -> Result<Vec<OutcomeRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, item_id, result, recorded_at
                FROM outcome_records
                WHERE session_id = ?1
                ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(id_i64("session_id", id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_outcome_row).collect()
    }

    async fn complete_session(
        &self,
        id: SessionId,
        completed_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        let res = sqlx::query("UPDATE training_sessions SET completed_at = ?2 WHERE id = ?1")
            .bind(id_i64("session_id", id.value())?)
            .bind(completed_at)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.fetch_session(id).await?.ok_or(StorageError::NotFound)
    }

    async fn completed_sessions(&self) -> Result<Vec<Session>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM training_sessions \
             WHERE completed_at IS NOT NULL ORDER BY completed_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn delete_oldest_sessions(&self, count: u32) -> Result<u32, StorageError> {
        if count == 0 {
            return Ok(0);
        }

        // selections and outcomes go with their session through ON DELETE CASCADE
        let res = sqlx::query(
            r"
                DELETE FROM training_sessions
                WHERE id IN (
                    SELECT id FROM training_sessions
                    ORDER BY started_at ASC, id ASC
                    LIMIT ?1
                )
            ",
        )
        .bind(i64::from(count))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        u32::try_from(res.rows_affected())
            .map_err(|_| StorageError::Serialization("deleted count overflow".into()))
    }
}
