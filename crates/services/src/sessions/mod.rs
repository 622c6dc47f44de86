mod plan;
mod progress;
mod recorder;

// Public API of the session subsystem.
pub use plan::{CandidatePools, Quotas, SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use recorder::{SessionAnswerResult, SessionRecorder};
