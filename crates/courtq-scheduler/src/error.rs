//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur while running assignment cycles.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("state store error: {0}")]
    State(#[from] courtq_state::StateError),

    #[error("assignment loop is already running")]
    AlreadyRunning,

    #[error("assignment loop is not running")]
    NotRunning,

    #[error("assignment loop task failed: {0}")]
    LoopTask(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
