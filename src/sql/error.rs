//! Query text screening errors.

use thiserror::Error;

/// Result type for screening operations.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Query text that must not be sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("empty query")]
    EmptyQuery,

    #[error("expected a single statement, found {0}")]
    MultipleStatements(usize),
}
