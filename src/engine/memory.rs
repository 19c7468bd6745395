//! In-process engine with scripted plans.
//!
//! [`MemoryEngine`] answers `explain` from plans registered per query text.
//! A plan can be tied to planner switches, so an engine primed with "hash
//! join by default, merge join once hash join and nested loop are off"
//! behaves like a real planner under directives. Used for tests, demos and
//! offline replays of captured `EXPLAIN` output.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::config::EngineConfig;
use super::error::{EngineError, EngineResult};
use super::session::{EngineSession, PlanEngine};
use crate::edit::{PlannerDirective, PlannerSettings, Strategy};

#[derive(Debug, Clone)]
struct PlanVariant {
    requires: Vec<PlannerDirective>,
    output: Value,
}

impl PlanVariant {
    fn matches(&self, settings: &PlannerSettings) -> bool {
        self.requires
            .iter()
            .all(|d| settings.is_enabled(d.strategy) == d.enabled)
    }
}

#[derive(Default)]
struct MemoryEngineInner {
    plans: RwLock<HashMap<String, Vec<PlanVariant>>>,
    tables: RwLock<Vec<String>>,
    rejected_settings: RwLock<Vec<Strategy>>,
    refuse_connections: AtomicBool,
    fail_resets: AtomicBool,
    connections: AtomicUsize,
    explains: AtomicUsize,
}

/// Engine double backed by registered plans.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<MemoryEngineInner>,
}

impl MemoryEngine {
    /// Create an engine that knows no queries and no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the plan returned for `sql` when no switch-specific plan applies.
    pub fn with_plan(self, sql: &str, output: Value) -> Self {
        self.with_plan_when(sql, &[], output)
    }

    /// Register the plan returned for `sql` while every directive in
    /// `requires` is in effect. The variant with the most requirements wins.
    pub fn with_plan_when(self, sql: &str, requires: &[PlannerDirective], output: Value) -> Self {
        self.inner
            .plans
            .write()
            .entry(normalize(sql))
            .or_default()
            .push(PlanVariant {
                requires: requires.to_vec(),
                output,
            });
        self
    }

    /// Base tables reported by `list_tables`.
    pub fn with_tables<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.inner.tables.write() = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Make every `connect` fail.
    pub fn refuse_connections(self) -> Self {
        self.inner.refuse_connections.store(true, Ordering::SeqCst);
        self
    }

    /// Make the engine refuse any directive touching `strategy`.
    pub fn reject_setting(self, strategy: Strategy) -> Self {
        self.inner.rejected_settings.write().push(strategy);
        self
    }

    /// Make `reset_directives` fail, leaving switches in place.
    pub fn fail_resets(self) -> Self {
        self.inner.fail_resets.store(true, Ordering::SeqCst);
        self
    }

    /// Sessions opened so far.
    pub fn connections(&self) -> usize {
        self.inner.connections.load(Ordering::SeqCst)
    }

    /// `explain` calls served so far.
    pub fn explains(&self) -> usize {
        self.inner.explains.load(Ordering::SeqCst)
    }
}

impl PlanEngine for MemoryEngine {
    type Session = MemorySession;

    fn connect(&self, config: &EngineConfig) -> EngineResult<MemorySession> {
        if self.inner.refuse_connections.load(Ordering::SeqCst) {
            return Err(EngineError::Connect {
                target: config.target(),
                message: "connection refused".into(),
            });
        }
        self.inner.connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            engine: self.inner.clone(),
            settings: PlannerSettings::default(),
        })
    }
}

/// A session with a [`MemoryEngine`].
pub struct MemorySession {
    engine: Arc<MemoryEngineInner>,
    settings: PlannerSettings,
}

impl MemorySession {
    /// Planner switches currently in effect.
    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }
}

impl EngineSession for MemorySession {
    fn explain(&mut self, sql: &str) -> EngineResult<Value> {
        self.engine.explains.fetch_add(1, Ordering::SeqCst);

        let plans = self.engine.plans.read();
        let variants = plans
            .get(&normalize(sql))
            .ok_or_else(|| EngineError::Rejected(format!("no plan registered for query: {}", sql)))?;

        variants
            .iter()
            .filter(|v| v.matches(&self.settings))
            .max_by_key(|v| v.requires.len())
            .map(|v| v.output.clone())
            .ok_or_else(|| {
                EngineError::Rejected(format!(
                    "no plan for query under current settings (disabled: {:?})",
                    self.settings.disabled()
                ))
            })
    }

    fn apply_directive(&mut self, directive: &PlannerDirective) -> EngineResult<()> {
        if self.engine.rejected_settings.read().contains(&directive.strategy) {
            return Err(EngineError::Rejected(format!(
                "unrecognized configuration parameter \"{}\"",
                directive.strategy.setting()
            )));
        }
        self.settings.apply(directive);
        Ok(())
    }

    fn reset_directives(&mut self) -> EngineResult<()> {
        if self.engine.fail_resets.load(Ordering::SeqCst) {
            return Err(EngineError::Protocol("connection lost during RESET".into()));
        }
        for strategy in Strategy::ALL {
            self.settings.reset(strategy);
        }
        Ok(())
    }

    fn list_tables(&mut self) -> EngineResult<Vec<String>> {
        Ok(self.engine.tables.read().clone())
    }
}

/// Collapse whitespace and drop trailing semicolons so formatting differences
/// do not matter when looking up a query.
fn normalize(sql: &str) -> String {
    sql.trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
