//! AdhocSQL - ad hoc SQL planning for a partitioned in-memory database.
//!
//! AdhocSQL compiles SQL submitted at runtime against a versioned catalog,
//! decides whether each statement can run on a single partition, and caches
//! the resulting plans so repeated statements skip compilation.
//!
//! # Architecture
//!
//! The planning pipeline is:
//! ```text
//! SQL String → Plan Cache (text) → Parse → Plan Cache (token) → Full Compile
//!            → Parameterization check → Determinism check → Routing → Cache insert
//! ```
//!
//! A [`PlannerTool`] is built per catalog version. It replays the catalog's
//! DDL into its embedded SQL engine once and is then shared across threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use adhocsql::{Cluster, Column, DataType, Database, PlannerTool, Table, Value};
//!
//! let catalog = Database::builder("shop")
//!     .table(
//!         Table::new("orders")
//!             .with_column(Column::not_null("id", DataType::BigInt))
//!             .with_column(Column::nullable("total", DataType::Decimal))
//!             .partitioned_on("id")
//!             .with_primary_key(&["id"]),
//!     )
//!     .build()?;
//! let planner = PlannerTool::new(Cluster::new("local", 8), Arc::new(catalog), 1).unwrap();
//!
//! // Planned once, then served from the token cache for any other id.
//! let first = planner.plan_sql("SELECT total FROM orders WHERE id = 1", None, true, true)?;
//! let second = planner.plan_sql("SELECT total FROM orders WHERE id = 2", None, true, true)?;
//! assert_eq!(second.partition_param, Some(Value::integer(2)));
//! ```

pub use adhocsql_catalog::{Cluster, Column, Database, DatabaseBuilder, Index, PartitionId, Table};
pub use adhocsql_common::error::{Error, Result};
pub use adhocsql_common::types::{DataType, ParameterSet, Value};
pub use adhocsql_planner::{
    AD_HOC_JOINED_TABLE_LIMIT, AdHocPlannedStatement, CorePlan, DeterminismClassifier,
    InferenceHints, NondeterminismPolicy, PartitioningAdvisor, PartitioningDecision, PlanCache,
    PlanCacheStats, PlannerConfig, PlannerError, PlannerResult, PlannerTool, Routing,
};
pub use adhocsql_sql::{
    CompiledPlan, CostModel, EmbeddedSqlCapability, EmbeddedSqlEngine, ParsedToken, PlanNode,
    PlanNodeKind, PlanOptions, TrivialCostModel,
};

/// Loads a [`PlannerConfig`] from TOML and builds a [`PlannerTool`] with it.
///
/// # Example
///
/// ```rust,ignore
/// let planner = adhocsql::planner_from_toml(
///     Cluster::new("local", 4),
///     Arc::new(catalog),
///     7,
///     "plan_cache_capacity = 100\nnondeterminism = \"fail\"",
/// )?;
/// ```
pub fn planner_from_toml(
    cluster: Cluster,
    catalog: std::sync::Arc<Database>,
    catalog_version: u64,
    config: &str,
) -> PlannerResult<PlannerTool> {
    let config = PlannerConfig::from_toml_str(config)?;
    PlannerTool::with_config(cluster, catalog, catalog_version, config)
}
