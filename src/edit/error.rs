//! Cost comparison errors.

use std::fmt;

use thiserror::Error;

/// Which side of a comparison a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSide {
    Original,
    Alternative,
}

impl fmt::Display for PlanSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSide::Original => write!(f, "original"),
            PlanSide::Alternative => write!(f, "alternative"),
        }
    }
}

/// A plan root carried no usable total cost.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{side} plan has no usable total cost (root: {node_type})")]
pub struct CostError {
    pub side: PlanSide,
    pub node_type: String,
}
