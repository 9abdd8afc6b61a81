//! Error types for the roster store.

use thiserror::Error;

/// Result type alias for roster store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Storage failures. Ordinary contention (full court, player already
/// moved) is reported through [`Outcome::Rejected`](crate::Outcome) instead.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}
