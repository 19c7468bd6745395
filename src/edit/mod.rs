//! What-if edits on plan trees.
//!
//! Edits are expressed per node id. The same [`ModificationSpec`] feeds two
//! independent paths: [`apply_modifications`] rewrites a plan for preview,
//! and [`compile_directives`] turns it into planner switches that make the
//! engine produce a real alternative plan. [`compare_costs`] diffs the two
//! plans the engine returned.

mod cost;
mod directive;
mod error;
mod modify;

pub use cost::{compare_costs, CostComparison};
pub use directive::{compile_directives, render_directives, PlannerDirective, PlannerSettings, Strategy};
pub use error::{CostError, PlanSide};
pub use modify::{apply_modifications, ModificationSpec, NodeModification};
