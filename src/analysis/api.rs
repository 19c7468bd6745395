//! What-if analysis API - the high-level interface callers use.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use ulid::Ulid;

use super::error::{WhatIfError, WhatIfResult};
use crate::edit::{
    apply_modifications, compare_costs, compile_directives, render_directives, CostComparison,
    ModificationSpec, PlannerDirective,
};
use crate::engine::{EngineConfig, EngineSession, PlanEngine, SessionPool};
use crate::plan::{assign_ids, IdScheme, PlanNode, DEFAULT_MAX_DEPTH};
use crate::sql::{screen_query, ScreenError};

/// Tables a TPC-H database must contain.
pub const TPCH_TABLES: [&str; 8] = [
    "customer", "lineitem", "nation", "orders", "part", "partsupp", "region", "supplier",
];

/// Analyzer configuration options.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// How to reach the engine.
    pub engine: EngineConfig,
    /// How retrieved plans are stamped with node ids.
    pub id_scheme: IdScheme,
    /// Plans deeper than this are refused.
    pub max_plan_depth: usize,
    /// Tables `validate_schema` expects.
    pub required_tables: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            id_scheme: IdScheme::default(),
            max_plan_depth: DEFAULT_MAX_DEPTH,
            required_tables: TPCH_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration for the given engine.
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            ..Default::default()
        }
    }

    /// Set the node id scheme.
    pub fn id_scheme(mut self, scheme: IdScheme) -> Self {
        self.id_scheme = scheme;
        self
    }

    /// Set the plan depth bound.
    pub fn max_plan_depth(mut self, depth: usize) -> Self {
        self.max_plan_depth = depth;
        self
    }

    /// Set the tables `validate_schema` expects.
    pub fn required_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> WhatIfResult<()> {
        if self.engine.max_sessions == 0 {
            return Err(WhatIfError::InvalidConfig("max_sessions must be at least 1".into()));
        }
        if self.max_plan_depth == 0 {
            return Err(WhatIfError::InvalidConfig("max_plan_depth must be at least 1".into()));
        }
        Ok(())
    }
}

/// Everything produced by one what-if run.
#[derive(Debug, Clone, Serialize)]
pub struct WhatIfReport {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub query: String,
    pub modifications: ModificationSpec,
    pub directives: Vec<PlannerDirective>,
    /// Plan the engine picks on its own.
    pub qep: PlanNode,
    /// The QEP with the edits written in, for display.
    pub preview: PlanNode,
    /// Plan the engine picks under the compiled directives.
    pub aqp: PlanNode,
    pub comparison: CostComparison,
}

/// Result of checking the engine for the expected tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    /// Base tables found.
    pub tables: Vec<String>,
    /// Required tables that were not found.
    pub missing: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Handle for running what-if analyses against one engine.
///
/// Every engine round trip takes a session from the pool for its own
/// exclusive use, so an analyzer can be shared between threads.
pub struct WhatIfAnalyzer<E: PlanEngine> {
    config: AnalyzerConfig,
    pool: SessionPool<E>,
}

impl<E: PlanEngine> WhatIfAnalyzer<E> {
    /// Create an analyzer. Sessions are opened on first use.
    pub fn new(engine: E, config: AnalyzerConfig) -> WhatIfResult<Self> {
        config.validate()?;
        let pool = SessionPool::new(engine, config.engine.clone());
        Ok(Self { config, pool })
    }

    /// Get the configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Get the session pool.
    pub fn pool(&self) -> &SessionPool<E> {
        &self.pool
    }

    /// Retrieve the plan the engine would use for `sql`, with ids assigned.
    pub fn get_qep(&self, sql: &str) -> WhatIfResult<PlanNode> {
        let sql = screen_query(sql)?;
        self.original_plan(sql)
    }

    /// Retrieve the plan the engine picks for `sql` once it is biased
    /// towards the operators requested in `mods`, with fresh ids assigned.
    ///
    /// The planner switches never outlive the request: they are reset on the
    /// session afterwards, or the session is discarded.
    pub fn get_aqp(&self, sql: &str, mods: &ModificationSpec) -> WhatIfResult<PlanNode> {
        let sql = screen_query(sql)?;
        let directives = compile_directives(mods);
        self.alternative_plan(sql, &directives)
    }

    /// Write the edits into a copy of `plan` without asking the engine.
    pub fn preview_modifications(&self, plan: &PlanNode, mods: &ModificationSpec) -> PlanNode {
        apply_modifications(plan, mods)
    }

    /// Compare the root costs of two plans.
    pub fn compare_costs(&self, original: &PlanNode, alternative: &PlanNode) -> WhatIfResult<CostComparison> {
        Ok(compare_costs(original, alternative)?)
    }

    /// Run a full what-if analysis: QEP, preview, AQP and their cost delta.
    pub fn analyze(&self, sql: &str, mods: &ModificationSpec) -> WhatIfResult<WhatIfReport> {
        let request_id = Ulid::new().to_string().to_lowercase();
        let span = info_span!("whatif", request_id = %request_id);
        let _enter = span.enter();

        let sql = screen_query(sql)?;
        let directives = compile_directives(mods);

        let qep = self.original_plan(sql)?;
        let preview = self.preview_modifications(&qep, mods);
        let aqp = self.alternative_plan(sql, &directives)?;
        let comparison = self.compare_costs(&qep, &aqp)?;

        info!(
            qep_root = %qep.node_type,
            aqp_root = %aqp.node_type,
            difference = comparison.difference,
            "what-if analysis complete"
        );

        Ok(WhatIfReport {
            request_id,
            generated_at: Utc::now(),
            query: sql.to_string(),
            modifications: mods.clone(),
            directives,
            qep,
            preview,
            aqp,
            comparison,
        })
    }

    /// Dry-run `sql` through the engine's planner.
    ///
    /// Returns `false` when the engine refuses the query. Failing to reach
    /// the engine is still an error.
    pub fn validate_query(&self, sql: &str) -> WhatIfResult<bool> {
        let sql = match screen_query(sql) {
            Ok(sql) => sql,
            Err(ScreenError::EmptyQuery) | Err(ScreenError::MultipleStatements(_)) => {
                return Ok(false);
            }
        };

        let mut session = self.pool.get()?;
        match session.explain(sql) {
            Ok(_) => Ok(true),
            Err(e) if e.is_connection() => Err(e.into()),
            Err(e) => {
                debug!(error = %e, "query rejected by engine");
                Ok(false)
            }
        }
    }

    /// Check that every required table exists in the engine.
    pub fn validate_schema(&self) -> WhatIfResult<SchemaReport> {
        let mut session = self.pool.get()?;
        let tables = session.list_tables()?;

        let missing: Vec<String> = self
            .config
            .required_tables
            .iter()
            .filter(|required| !tables.iter().any(|t| t == *required))
            .cloned()
            .collect();

        if !missing.is_empty() {
            warn!(?missing, "required tables missing from schema");
        }

        Ok(SchemaReport { tables, missing })
    }

    fn original_plan(&self, sql: &str) -> WhatIfResult<PlanNode> {
        let mut session = self.pool.get()?;
        self.retrieve(&mut session, sql)
    }

    /// Directives are applied and the plan is requested on one exclusively
    /// held session. The planner switches are reset afterwards whether or
    /// not the request succeeded; a session that cannot be reset is
    /// discarded.
    fn alternative_plan(&self, sql: &str, directives: &[PlannerDirective]) -> WhatIfResult<PlanNode> {
        debug!(
            count = directives.len(),
            directives = %render_directives(directives),
            "compiled planner directives"
        );

        let mut session = self.pool.get()?;
        let result = self.retrieve_with(&mut session, directives, sql);

        match session.reset_directives() {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "failed to reset planner settings, discarding session");
                session.discard();
            }
        }

        result
    }

    fn retrieve(&self, session: &mut E::Session, sql: &str) -> WhatIfResult<PlanNode> {
        let output = session.explain(sql)?;
        let mut plan = PlanNode::from_explain(&output)?;
        let report = assign_ids(&mut plan, self.config.id_scheme, self.config.max_plan_depth)?;
        debug!(nodes = report.nodes, depth = report.depth, "retrieved plan");
        Ok(plan)
    }

    fn retrieve_with(
        &self,
        session: &mut E::Session,
        directives: &[PlannerDirective],
        sql: &str,
    ) -> WhatIfResult<PlanNode> {
        session.apply_directives(directives)?;
        self.retrieve(session, sql)
    }
}
