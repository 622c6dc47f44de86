use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use vocab_core::model::{
    Item, ItemId, MasteryLevel, OutcomeRecord, ProgressRecord, ReviewMode, SelectedItem, Session,
    SessionId, TrainingResult,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn item_id_from_i64(v: i64) -> Result<ItemId, StorageError> {
    Ok(ItemId::new(i64_to_u64("item_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn parse_mastery_level(s: &str) -> Result<MasteryLevel, StorageError> {
    s.parse().map_err(ser)
}

fn count(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_item_row(row: &SqliteRow) -> Result<Item, StorageError> {
    let level: String = row.try_get("mastery_level").map_err(ser)?;
    Item::new(
        item_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("term").map_err(ser)?,
        parse_mastery_level(&level)?,
    )
    .map_err(ser)
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<Session, StorageError> {
    let mode: String = row.try_get("review_mode").map_err(ser)?;
    Ok(Session::from_persisted(
        session_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        mode.parse::<ReviewMode>().map_err(ser)?,
        count(row, "total_words")?,
        count(row, "correct_answers")?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    ))
}

pub(crate) fn map_selected_row(row: &SqliteRow) -> Result<SelectedItem, StorageError> {
    Ok(SelectedItem {
        item_id: item_id_from_i64(row.try_get::<i64, _>("item_id").map_err(ser)?)?,
        order: count(row, "item_order")?,
    })
}

pub(crate) fn map_outcome_row(row: &SqliteRow) -> Result<OutcomeRecord, StorageError> {
    let result: String = row.try_get("result").map_err(ser)?;
    Ok(OutcomeRecord::new(
        session_id_from_i64(row.try_get::<i64, _>("session_id").map_err(ser)?)?,
        item_id_from_i64(row.try_get::<i64, _>("item_id").map_err(ser)?)?,
        result.parse::<TrainingResult>().map_err(ser)?,
        row.try_get("recorded_at").map_err(ser)?,
    ))
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    ProgressRecord::from_persisted(
        item_id_from_i64(row.try_get::<i64, _>("item_id").map_err(ser)?)?,
        count(row, "total_attempts")?,
        count(row, "total_correct")?,
        count(row, "consecutive_correct")?,
        row.try_get("last_reviewed_at").map_err(ser)?,
        row.try_get("mastery_level_updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
