//! Engine boundary errors.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by, or on the way to, the relational engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No session could be established.
    #[error("cannot connect to {target}: {message}")]
    Connect { target: String, message: String },

    /// Every pooled session stayed checked out for the whole checkout timeout.
    #[error("timed out waiting for a session ({max_sessions} sessions in use)")]
    PoolExhausted { max_sessions: usize },

    /// The engine refused a statement.
    #[error("engine rejected statement: {0}")]
    Rejected(String),

    /// The engine answered with something unexpected.
    #[error("unexpected engine response: {0}")]
    Protocol(String),
}

impl EngineError {
    /// Whether the failure happened before a session existed.
    pub fn is_connection(&self) -> bool {
        matches!(self, EngineError::Connect { .. })
    }
}
