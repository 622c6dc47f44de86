#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod progress_tracker;
pub mod retention;
pub mod sessions;
pub mod stats_service;
pub mod training_services;

pub use vocab_core::Clock;

pub use config::TrainingConfig;
pub use error::{ConfigError, ServicesInitError, TrainingError};
pub use progress_tracker::ProgressTracker;
pub use retention::RetentionService;
pub use sessions::{SessionAnswerResult, SessionProgress, SessionRecorder};
pub use stats_service::StatisticsService;
pub use training_services::TrainingServices;
