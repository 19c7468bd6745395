//! What-if analysis errors.

use thiserror::Error;

use crate::engine::EngineError;
use crate::plan::PlanError;
use crate::sql::ScreenError;
use crate::edit::CostError;

/// Result type for analysis operations.
pub type WhatIfResult<T> = Result<T, WhatIfError>;

/// Everything a what-if request can fail with.
///
/// Callers can tell "no session" from "engine refused" from "engine answered
/// but the plan has no cost" by the variant alone.
#[derive(Debug, Error)]
pub enum WhatIfError {
    /// No session with the engine could be established.
    #[error("connection error: {0}")]
    Connection(EngineError),

    /// The engine rejected the query or a directive, or its plan was unreadable.
    #[error("plan retrieval error: {0}")]
    PlanRetrieval(String),

    /// Every pooled session stayed busy past the checkout timeout.
    #[error("engine busy: {0}")]
    Busy(EngineError),

    /// A plan root carried no usable total cost.
    #[error("cost extraction error: {0}")]
    CostExtraction(#[from] CostError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for WhatIfError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Connect { .. } => WhatIfError::Connection(e),
            EngineError::PoolExhausted { .. } => WhatIfError::Busy(e),
            other => WhatIfError::PlanRetrieval(other.to_string()),
        }
    }
}

impl From<PlanError> for WhatIfError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::Io(io) => WhatIfError::Io(io),
            other => WhatIfError::PlanRetrieval(other.to_string()),
        }
    }
}

impl From<ScreenError> for WhatIfError {
    fn from(e: ScreenError) -> Self {
        WhatIfError::PlanRetrieval(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::PlanSide;

    #[test]
    fn test_engine_error_classification() {
        let refused = EngineError::Connect {
            target: "postgres@localhost:5432/tpch".into(),
            message: "connection refused".into(),
        };
        assert!(matches!(WhatIfError::from(refused), WhatIfError::Connection(_)));

        let busy = EngineError::PoolExhausted { max_sessions: 4 };
        assert!(matches!(WhatIfError::from(busy), WhatIfError::Busy(_)));

        let rejected = EngineError::Rejected("syntax error at or near \"SELEC\"".into());
        match WhatIfError::from(rejected) {
            WhatIfError::PlanRetrieval(message) => assert!(message.contains("SELEC")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plan_error_classification() {
        let malformed = PlanError::Malformed("empty explain output".into());
        assert!(matches!(WhatIfError::from(malformed), WhatIfError::PlanRetrieval(_)));

        let io = PlanError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "plan.json"));
        assert!(matches!(WhatIfError::from(io), WhatIfError::Io(_)));
    }

    #[test]
    fn test_cost_error_kept_distinct() {
        let err = WhatIfError::from(CostError {
            side: PlanSide::Alternative,
            node_type: "Result".into(),
        });
        assert!(matches!(err, WhatIfError::CostExtraction(_)));
        assert!(err.to_string().starts_with("cost extraction error"));
    }
}
