use vocab_core::model::{Item, ItemId, MasteryLevel};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_item_row};
use crate::repository::{ItemRepository, StorageError};

#[async_trait::async_trait]
impl ItemRepository for SqliteRepository {
    async fn upsert_item(&self, item: &Item) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO items (id, term, mastery_level)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                term = excluded.term,
                mastery_level = excluded.mastery_level
            ",
        )
        .bind(id_i64("item_id", item.id().value())?)
        .bind(item.term())
        .bind(item.mastery_level().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StorageError> {
        let row = sqlx::query("SELECT id, term, mastery_level FROM items WHERE id = ?1")
            .bind(id_i64("item_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_item_row).transpose()
    }

    async fn list_by_mastery_level(&self, level: MasteryLevel) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, term, mastery_level
            FROM items
            WHERE mastery_level = ?1
            ORDER BY id ASC
            ",
        )
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_item_row).collect()
    }
}
