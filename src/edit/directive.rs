//! Planner directives.
//!
//! The engine cannot be told "use an index scan for node 110". What it does
//! offer are session-wide strategy switches (`enable_seqscan`,
//! `enable_hashjoin`, ...), so every edit is compiled into switches that push
//! the planner towards the requested operator everywhere in the query.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::modify::ModificationSpec;

/// A planner strategy that can be switched on or off per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    SeqScan,
    IndexScan,
    BitmapScan,
    MergeJoin,
    HashJoin,
    NestLoop,
}

impl Strategy {
    /// Every strategy this crate can switch.
    pub const ALL: [Strategy; 6] = [
        Strategy::SeqScan,
        Strategy::IndexScan,
        Strategy::BitmapScan,
        Strategy::MergeJoin,
        Strategy::HashJoin,
        Strategy::NestLoop,
    ];

    /// Name of the engine setting controlling this strategy.
    pub fn setting(&self) -> &'static str {
        match self {
            Strategy::SeqScan => "enable_seqscan",
            Strategy::IndexScan => "enable_indexscan",
            Strategy::BitmapScan => "enable_bitmapscan",
            Strategy::MergeJoin => "enable_mergejoin",
            Strategy::HashJoin => "enable_hashjoin",
            Strategy::NestLoop => "enable_nestloop",
        }
    }

    fn index(&self) -> usize {
        match self {
            Strategy::SeqScan => 0,
            Strategy::IndexScan => 1,
            Strategy::BitmapScan => 2,
            Strategy::MergeJoin => 3,
            Strategy::HashJoin => 4,
            Strategy::NestLoop => 5,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.setting())
    }
}

/// One strategy switch, e.g. `SET enable_seqscan = off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannerDirective {
    pub strategy: Strategy,
    pub enabled: bool,
}

impl PlannerDirective {
    pub fn enable(strategy: Strategy) -> Self {
        Self {
            strategy,
            enabled: true,
        }
    }

    pub fn disable(strategy: Strategy) -> Self {
        Self {
            strategy,
            enabled: false,
        }
    }
}

impl fmt::Display for PlannerDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.enabled { "on" } else { "off" };
        write!(f, "SET {} = {}", self.strategy.setting(), value)
    }
}

/// Current value of every strategy switch in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    enabled: [bool; 6],
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self { enabled: [true; 6] }
    }
}

impl PlannerSettings {
    pub fn is_enabled(&self, strategy: Strategy) -> bool {
        self.enabled[strategy.index()]
    }

    /// Apply one directive. Later directives overwrite earlier ones.
    pub fn apply(&mut self, directive: &PlannerDirective) {
        self.enabled[directive.strategy.index()] = directive.enabled;
    }

    /// Apply directives in order.
    pub fn apply_all<'a>(&mut self, directives: impl IntoIterator<Item = &'a PlannerDirective>) {
        for directive in directives {
            self.apply(directive);
        }
    }

    /// Put one strategy back to its default.
    pub fn reset(&mut self, strategy: Strategy) {
        self.enabled[strategy.index()] = true;
    }

    /// Whether every strategy is at its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Strategies currently switched off.
    pub fn disabled(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|s| !self.is_enabled(*s))
            .collect()
    }
}

fn scan_directives(scan_type: &str) -> Option<[PlannerDirective; 3]> {
    use PlannerDirective as D;
    use Strategy::*;

    match scan_type {
        "Index Scan" => Some([D::disable(SeqScan), D::enable(IndexScan), D::disable(BitmapScan)]),
        "Seq Scan" => Some([D::enable(SeqScan), D::disable(IndexScan), D::disable(BitmapScan)]),
        _ => None,
    }
}

fn join_directives(node_type: &str) -> Option<[PlannerDirective; 3]> {
    use PlannerDirective as D;
    use Strategy::*;

    match node_type {
        "Merge Join" => Some([D::enable(MergeJoin), D::disable(HashJoin), D::disable(NestLoop)]),
        "Hash Join" => Some([D::disable(MergeJoin), D::enable(HashJoin), D::disable(NestLoop)]),
        "Nested Loop" => Some([D::disable(MergeJoin), D::disable(HashJoin), D::enable(NestLoop)]),
        _ => None,
    }
}

/// Compile edits into strategy switches.
///
/// Entries are handled in insertion order, scan type before node type.
/// Only scan methods (`Index Scan`, `Seq Scan`) and the three join operators
/// map to switches; any other value yields nothing. Conflicting entries are
/// not resolved here, the engine applies the sequence last-write-wins.
pub fn compile_directives(mods: &ModificationSpec) -> Vec<PlannerDirective> {
    let mut directives = Vec::new();

    for (node_id, modification) in mods.iter() {
        if let Some(ref scan_type) = modification.scan_type {
            match scan_directives(scan_type) {
                Some(compiled) => directives.extend(compiled),
                None => debug!(node_id, scan_type = %scan_type, "no planner directive for scan type"),
            }
        }
        if let Some(ref node_type) = modification.node_type {
            match join_directives(node_type) {
                Some(compiled) => directives.extend(compiled),
                None => debug!(node_id, node_type = %node_type, "no planner directive for node type"),
            }
        }
    }

    directives
}

/// Render directives as one statement batch.
pub fn render_directives(directives: &[PlannerDirective]) -> String {
    directives
        .iter()
        .map(|d| format!("{};", d))
        .collect::<Vec<_>>()
        .join(" ")
}
