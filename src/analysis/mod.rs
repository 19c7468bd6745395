//! What-if analysis.
//!
//! [`WhatIfAnalyzer`] is the surface callers (a GUI, the CLI) talk to. It
//! ties the pieces together:
//!
//! ```text
//! query text ──► get_qep ──► QEP (ids assigned)
//!                              │
//!        modifications ────────┼──────────────────────┐
//!                              ▼                      ▼
//!                  preview_modifications       compile_directives
//!                              │                      │
//!                              ▼                      ▼
//!                       preview tree      get_aqp (one session, reset after)
//!                                                     │
//!                        compare_costs(QEP, AQP) ◄────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use serde_json::json;
//! use whatif::analysis::{AnalyzerConfig, WhatIfAnalyzer};
//! use whatif::engine::MemoryEngine;
//! use whatif::edit::{ModificationSpec, NodeModification};
//!
//! let engine = MemoryEngine::new()
//!     .with_plan("SELECT * FROM nation", json!([{"Plan": {"Node Type": "Seq Scan", "Total Cost": 1.25}}]));
//! let analyzer = WhatIfAnalyzer::new(engine, AnalyzerConfig::default()).unwrap();
//!
//! let qep = analyzer.get_qep("SELECT * FROM nation").unwrap();
//! let mods = ModificationSpec::new().with(1, NodeModification::scan("Index Scan"));
//! let preview = analyzer.preview_modifications(&qep, &mods);
//! assert_eq!(preview.node_type, "Index Scan");
//! ```

mod api;
mod error;

pub use api::{AnalyzerConfig, SchemaReport, WhatIfAnalyzer, WhatIfReport, TPCH_TABLES};
pub use error::{WhatIfError, WhatIfResult};
