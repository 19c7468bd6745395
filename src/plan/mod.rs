//! Plan trees.
//!
//! This module holds the in-memory form of an engine's query plan, the parser
//! for its `EXPLAIN (FORMAT JSON)` output and the node id assignment used to
//! address individual operators.

mod error;
mod ids;
mod node;

pub use error::{PlanError, PlanResult};
pub use ids::{assign_ids, IdReport, IdScheme, DEFAULT_MAX_DEPTH};
pub use node::{PlanNode, PreOrder};
