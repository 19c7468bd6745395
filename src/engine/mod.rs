//! The relational engine boundary.
//!
//! The what-if core relies on an engine for two things: compiling a query
//! into a plan without running it, and session-scoped planner switches.
//! [`PlanEngine`] and [`EngineSession`] describe that contract, [`SessionPool`]
//! hands sessions out exclusively, and [`MemoryEngine`] is an in-process
//! engine driven by registered plans.

mod config;
mod error;
mod memory;
mod pool;
mod session;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use memory::{MemoryEngine, MemorySession};
pub use pool::{PooledSession, SessionPool};
pub use session::{EngineSession, PlanEngine};
