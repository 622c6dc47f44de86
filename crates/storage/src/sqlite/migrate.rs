use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs versioned migrations for the training schema.
///
/// Version 1 creates items, sessions with their selections and outcome logs,
/// per-item progress, and the indexes used by pool sampling, stats and pruning.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY,
                    term TEXT NOT NULL,
                    mastery_level TEXT NOT NULL
                        CHECK (mastery_level IN ('NEW', 'LEARNING', 'KNOWN', 'MASTERED'))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // AUTOINCREMENT keeps ids of pruned sessions from being handed out again.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS training_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    review_mode TEXT NOT NULL
                        CHECK (review_mode IN ('NEW', 'LEARNING', 'KNOWN', 'MIXED')),
                    total_words INTEGER NOT NULL CHECK (total_words >= 0),
                    correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
                    started_at TEXT NOT NULL,
                    completed_at TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_items (
                    session_id INTEGER NOT NULL,
                    item_id INTEGER NOT NULL,
                    item_order INTEGER NOT NULL CHECK (item_order >= 0),
                    PRIMARY KEY (session_id, item_order),
                    FOREIGN KEY (session_id) REFERENCES training_sessions(id) ON DELETE CASCADE,
                    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS outcome_records (
                    id INTEGER PRIMARY KEY,
                    session_id INTEGER NOT NULL,
                    item_id INTEGER NOT NULL,
                    result TEXT NOT NULL
                        CHECK (result IN ('CORRECT', 'INCORRECT', 'SKIPPED')),
                    recorded_at TEXT NOT NULL,
                    FOREIGN KEY (session_id) REFERENCES training_sessions(id) ON DELETE CASCADE,
                    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_records (
                    item_id INTEGER PRIMARY KEY,
                    total_attempts INTEGER NOT NULL CHECK (total_attempts >= 0),
                    total_correct INTEGER NOT NULL CHECK (total_correct >= 0),
                    consecutive_correct INTEGER NOT NULL CHECK (consecutive_correct >= 0),
                    last_reviewed_at TEXT NOT NULL,
                    mastery_level_updated_at TEXT,
                    CHECK (total_correct <= total_attempts),
                    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_items_mastery_level
                    ON items (mastery_level, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_training_sessions_started
                    ON training_sessions (started_at, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_training_sessions_completed
                    ON training_sessions (completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_outcome_records_session_recorded
                    ON outcome_records (session_id, recorded_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
