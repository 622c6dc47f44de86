mod error;
mod ids;
mod item;
mod progress;
mod session;
mod stats;
mod training;

pub use error::ModelError;
pub use ids::{ItemId, ParseIdError, SessionId};

pub use item::{Item, MasteryLevel};
pub use progress::{MasteryChange, ProgressRecord};
pub use session::{NewSession, ReviewMode, SelectedItem, Session};
pub use stats::TrainingStats;
pub use training::{OutcomeRecord, TrainingResult};
