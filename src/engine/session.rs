//! The engine boundary.
//!
//! The what-if core never talks to a database driver directly. It needs two
//! things from the engine: plan-only compilation of a query and
//! session-scoped planner switches. A driver crate plugs in by implementing
//! these traits.

use serde_json::Value;

use super::config::EngineConfig;
use super::error::EngineResult;
use crate::edit::PlannerDirective;

/// An open session with the engine.
///
/// Planner switches applied through a session affect later `explain` calls
/// on that same session only.
pub trait EngineSession: Send {
    /// Compile `sql` without running it and return the engine's
    /// `EXPLAIN (FORMAT JSON)` document.
    fn explain(&mut self, sql: &str) -> EngineResult<Value>;

    /// Apply one planner switch for the rest of the session.
    fn apply_directive(&mut self, directive: &PlannerDirective) -> EngineResult<()>;

    /// Put every planner switch back to the engine default.
    fn reset_directives(&mut self) -> EngineResult<()>;

    /// Names of the base tables in the public schema.
    fn list_tables(&mut self) -> EngineResult<Vec<String>>;

    /// Apply planner switches in order.
    fn apply_directives(&mut self, directives: &[PlannerDirective]) -> EngineResult<()> {
        for directive in directives {
            self.apply_directive(directive)?;
        }
        Ok(())
    }
}

/// Something sessions can be opened against.
pub trait PlanEngine: Send + Sync {
    type Session: EngineSession;

    /// Open a new session.
    fn connect(&self, config: &EngineConfig) -> EngineResult<Self::Session>;
}
