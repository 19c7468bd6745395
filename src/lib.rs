//! What-if analysis for query execution plans.
//!
//! Take the plan a relational engine picks for a query (the QEP), edit
//! individual operators ("use an index scan here", "merge join instead"),
//! and get back the alternative plan (AQP) the engine produces once it is
//! nudged towards those edits, together with the cost difference.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use whatif::analysis::{AnalyzerConfig, WhatIfAnalyzer};
//! use whatif::engine::MemoryEngine;
//! use whatif::edit::{ModificationSpec, NodeModification, PlannerDirective, Strategy};
//!
//! let sql = "SELECT * FROM orders o JOIN customer c ON o.o_custkey = c.c_custkey";
//! let engine = MemoryEngine::new()
//!     .with_plan(sql, json!([{"Plan": {"Node Type": "Hash Join", "Total Cost": 100.0}}]))
//!     .with_plan_when(
//!         sql,
//!         &[PlannerDirective::disable(Strategy::HashJoin)],
//!         json!([{"Plan": {"Node Type": "Merge Join", "Total Cost": 85.5}}]),
//!     );
//!
//! let analyzer = WhatIfAnalyzer::new(engine, AnalyzerConfig::default()).unwrap();
//! let mods = ModificationSpec::new().with(1, NodeModification::operator("Merge Join"));
//! let report = analyzer.analyze(sql, &mods).unwrap();
//!
//! assert_eq!(report.aqp.node_type, "Merge Join");
//! assert_eq!(report.comparison.difference, -14.5);
//! ```

pub mod analysis;
pub mod edit;
pub mod engine;
pub mod plan;
pub mod sql;
