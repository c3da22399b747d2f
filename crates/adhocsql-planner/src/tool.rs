use std::sync::Arc;

use adhocsql_catalog::{Cluster, Database};
use adhocsql_common::types::{ParameterSet, Value};
use adhocsql_sql::{
    CompiledPlan, EmbeddedSqlCapability, EmbeddedSqlEngine, ParsedToken, PlanOptions,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::bootstrap::load_schema;
use crate::cache::{PlanCache, PlanCacheStats};
use crate::config::PlannerConfig;
use crate::determinism::DeterminismClassifier;
use crate::error::{PlannerError, PlannerResult};
use crate::partitioning::{InferenceHints, PartitioningAdvisor};
use crate::statement::{AdHocPlannedStatement, CorePlan};

/// How one statement gets its plan once it has been parsed.
#[derive(Debug, Clone, PartialEq)]
enum CompilePath {
    /// The caller pinned the partition or disabled inference: plan it fresh
    /// and never cache it.
    Ineligible,
    /// A structurally identical statement was planned before.
    TokenHit {
        token: ParsedToken,
        core: Arc<CorePlan>,
    },
    /// Plan it fresh; cache it afterwards if it has a token and was
    /// parameterized.
    FullCompile { token: Option<ParsedToken> },
}

/// Plans ad hoc SQL against one catalog version.
///
/// The tool owns one embedded SQL engine, loaded with the catalog's DDL at
/// construction, and a [`PlanCache`] bound to the same version. The engine
/// is not reentrant, so parsing and planning are serialized on a lock;
/// literal cache hits never touch it. A new catalog version needs a new
/// tool.
pub struct PlannerTool<E = EmbeddedSqlEngine> {
    catalog: Arc<Database>,
    catalog_version: u64,
    engine: Mutex<E>,
    cache: PlanCache,
    advisor: PartitioningAdvisor,
    classifier: DeterminismClassifier,
    options: PlanOptions,
    config: PlannerConfig,
}

impl PlannerTool<EmbeddedSqlEngine> {
    pub fn new(cluster: Cluster, catalog: Arc<Database>, catalog_version: u64) -> PlannerResult<Self> {
        Self::with_config(cluster, catalog, catalog_version, PlannerConfig::default())
    }

    pub fn with_config(
        cluster: Cluster,
        catalog: Arc<Database>,
        catalog_version: u64,
        config: PlannerConfig,
    ) -> PlannerResult<Self> {
        let engine = EmbeddedSqlEngine::new(Arc::clone(&catalog));
        Self::with_capability(cluster, catalog, catalog_version, config, engine)
    }
}

impl<E: EmbeddedSqlCapability> PlannerTool<E> {
    /// Builds a tool around `engine`, replaying the catalog's DDL into it
    /// first. Fails on the first statement the engine rejects.
    pub fn with_capability(
        cluster: Cluster,
        catalog: Arc<Database>,
        catalog_version: u64,
        config: PlannerConfig,
        mut engine: E,
    ) -> PlannerResult<Self> {
        config.validate()?;
        let statements = load_schema(&catalog, &mut engine)?;
        info!(
            catalog = catalog.name(),
            catalog_version, statements, "loaded schema into ad hoc planner"
        );

        Ok(Self {
            cache: PlanCache::new(catalog_version, config.cache_capacity()),
            advisor: PartitioningAdvisor::new(cluster),
            classifier: DeterminismClassifier::new(config.nondeterminism),
            options: PlanOptions::trivial(config.joined_table_limit),
            engine: Mutex::new(engine),
            catalog,
            catalog_version,
            config,
        })
    }

    pub fn catalog(&self) -> &Database {
        &self.catalog
    }

    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    pub fn cluster(&self) -> &Cluster {
        self.advisor.cluster()
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> PlanCacheStats {
        self.cache.stats()
    }

    /// Plans `sql`, reusing cached work where the statement allows it.
    ///
    /// A statement is cached only when `partition_param` is absent and
    /// `infer_sp` is set. With `partition_param` the statement is routed to
    /// the partition owning that value; otherwise, with `infer_sp`, to the
    /// partition its predicates pin it to, if any. With
    /// `allow_parameterization` cleared, a statement that declares
    /// parameters without supplying values for them is rejected.
    pub fn plan_sql(
        &self,
        sql: &str,
        partition_param: Option<&Value>,
        infer_sp: bool,
        allow_parameterization: bool,
    ) -> PlannerResult<AdHocPlannedStatement> {
        if sql.is_empty() {
            return Err(PlannerError::EmptySql);
        }
        debug!(sql, "planning ad hoc statement");

        let cacheable = partition_param.is_none() && infer_sp;
        if cacheable && let Some(statement) = self.cache.lookup_by_sql(sql) {
            debug!(sql, tier = "sql", "plan cache hit");
            return Ok(statement);
        }

        let trimmed = sql.trim();
        let mut engine = self.engine.lock();
        let token = engine.parse(trimmed).map_err(compile_error)?;

        match self.compile_path(cacheable, token) {
            CompilePath::TokenHit { token, core } => {
                debug!(sql, tier = "token", "plan cache hit");
                let statement = self.reuse(&mut *engine, sql, core)?;
                drop(engine);
                self.cache.insert(sql, token, statement.clone())?;
                Ok(statement)
            }
            CompilePath::FullCompile { token } => {
                let (plan, parameterized) = full_compile(&mut *engine, trimmed, &self.options)?;
                drop(engine);
                self.finish(sql, plan, partition_param, infer_sp, allow_parameterization)
                    .and_then(|(statement, reusable)| {
                        if let Some(token) = token
                            && parameterized
                            && reusable
                        {
                            self.cache.insert(sql, token, statement.clone())?;
                        }
                        Ok(statement)
                    })
            }
            CompilePath::Ineligible => {
                let (plan, _) = full_compile(&mut *engine, trimmed, &self.options)?;
                drop(engine);
                self.finish(sql, plan, partition_param, infer_sp, allow_parameterization)
                    .map(|(statement, _)| statement)
            }
        }
    }

    fn compile_path(&self, cacheable: bool, token: Option<ParsedToken>) -> CompilePath {
        if !cacheable {
            return CompilePath::Ineligible;
        }
        match token {
            Some(token) => match self.cache.lookup_by_token(&token) {
                Some(core) => CompilePath::TokenHit { token, core },
                None => CompilePath::FullCompile { token: Some(token) },
            },
            None => CompilePath::FullCompile { token: None },
        }
    }

    /// Rebuilds a statement from a cached core plan and the literals of the
    /// statement the engine just parsed.
    fn reuse(
        &self,
        engine: &mut E,
        sql: &str,
        core: Arc<CorePlan>,
    ) -> PlannerResult<AdHocPlannedStatement> {
        engine
            .set_real_param_types(&core.parameter_types)
            .map_err(compile_error)?;
        let parameters = engine.extracted_parameters();
        let partition_param = core
            .partitioning_param_index
            .and_then(|index| parameters.get(index).cloned());

        Ok(AdHocPlannedStatement {
            sql: sql.to_string(),
            routing: self.advisor.route(partition_param.as_ref()),
            parameters: ParameterSet::from(parameters),
            partition_param,
            core,
            catalog_version: self.catalog_version,
        })
    }

    /// Checks a freshly compiled plan and turns it into a statement. The
    /// flag tells whether its partition key can be recomputed on reuse.
    fn finish(
        &self,
        sql: &str,
        plan: CompiledPlan,
        partition_param: Option<&Value>,
        infer_sp: bool,
        allow_parameterization: bool,
    ) -> PlannerResult<(AdHocPlannedStatement, bool)> {
        if !allow_parameterization
            && plan.extracted_param_values.is_empty()
            && plan.parameter_count() > 0
        {
            return Err(PlannerError::ParameterizationViolation);
        }
        self.classifier.classify(sql, &plan)?;

        let decision = self.advisor.decide(
            partition_param,
            InferenceHints::uniform(infer_sp),
            &plan.partitioning,
        );
        let partition_param = decision.resolve(&plan.extracted_param_values);

        let core = CorePlan {
            root: Arc::new(plan.root),
            parameter_types: plan.parameters,
            partitioning_param_index: decision.parameter_index(),
            read_only: plan.read_only,
            nondeterminism_detail: plan.nondeterminism_detail,
            catalog_version: self.catalog_version,
        };
        let statement = AdHocPlannedStatement {
            sql: sql.to_string(),
            core: Arc::new(core),
            parameters: ParameterSet::from(plan.extracted_param_values),
            routing: self.advisor.route(partition_param.as_ref()),
            partition_param,
            catalog_version: self.catalog_version,
        };
        Ok((statement, decision.is_reusable()))
    }
}

fn compile_error(e: adhocsql_common::Error) -> PlannerError {
    PlannerError::Compile(e.to_string())
}

/// Runs the engine's full compile. The flag is whether it parameterized
/// the statement's literals.
fn full_compile<E: EmbeddedSqlCapability + ?Sized>(
    engine: &mut E,
    sql: &str,
    options: &PlanOptions,
) -> PlannerResult<(CompiledPlan, bool)> {
    match engine.plan(sql, options) {
        Ok(Some(plan)) => Ok((plan, engine.compiled_as_parameterized_plan())),
        Ok(None) => Err(match engine.last_error_message() {
            Some(message) => PlannerError::Planning(message),
            None => PlannerError::UnknownPlanning,
        }),
        Err(e) => Err(compile_error(e)),
    }
}
