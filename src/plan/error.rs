//! Plan parsing and id assignment errors.

use thiserror::Error;

/// Result type for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while reading or stamping a plan tree.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed plan: {0}")]
    Malformed(String),

    #[error("invalid plan json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan deeper than {max_depth} levels")]
    TooDeep { max_depth: usize },

    #[error("node id overflow below node {parent_id}")]
    IdOverflow { parent_id: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
