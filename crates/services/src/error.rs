//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use vocab_core::model::{ItemId, SessionId};

/// Errors emitted by the training services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while validating `TrainingConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("default session length must be at least 1")]
    ZeroDefaultLength,
    #[error("default session length {default} exceeds maximum {max}")]
    DefaultExceedsMax { default: u32, max: u32 },
    #[error("recent sessions limit must be at least 1")]
    ZeroRecentLimit,
}

/// Errors emitted while bootstrapping the training services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServicesInitError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
