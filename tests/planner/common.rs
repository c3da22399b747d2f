#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adhocsql::{
    Cluster, Column, CompiledPlan, DataType, Database, EmbeddedSqlCapability, EmbeddedSqlEngine,
    Index, ParsedToken, PlanOptions, PlannerConfig, PlannerTool, Result, Table, Value,
};

pub const PARTITIONS: u32 = 8;

pub fn catalog() -> Arc<Database> {
    Arc::new(
        Database::builder("adhoc")
            .table(
                Table::new("t")
                    .with_column(Column::not_null("pkey", DataType::BigInt))
                    .with_column(Column::nullable("v", DataType::Varchar(Some(16))))
                    .with_column(Column::nullable("n", DataType::Integer))
                    .partitioned_on("pkey")
                    .with_primary_key(&["pkey"]),
            )
            .table(
                Table::new("orders")
                    .with_column(Column::not_null("o_id", DataType::BigInt))
                    .with_column(Column::not_null("pkey", DataType::BigInt))
                    .with_column(Column::nullable("total", DataType::Decimal))
                    .partitioned_on("pkey")
                    .with_primary_key(&["pkey", "o_id"]),
            )
            .table(
                Table::new("codes")
                    .with_column(Column::not_null("code", DataType::Integer))
                    .with_column(Column::nullable("label", DataType::Varchar(None)))
                    .with_index(Index::new("IDX_CODE", &["code"], true)),
            )
            .build()
            .unwrap(),
    )
}

pub fn cluster() -> Cluster {
    Cluster::new("test", PARTITIONS)
}

pub fn planner() -> PlannerTool {
    PlannerTool::new(cluster(), catalog(), 1).unwrap()
}

pub fn planner_with(config: PlannerConfig) -> PlannerTool {
    PlannerTool::with_config(cluster(), catalog(), 1, config).unwrap()
}

/// Wraps the embedded engine and counts full compiles.
pub struct CountingEngine {
    inner: EmbeddedSqlEngine,
    plans: Arc<AtomicUsize>,
}

impl EmbeddedSqlCapability for CountingEngine {
    fn ingest_ddl(&mut self, statement: &str) -> Result<()> {
        self.inner.ingest_ddl(statement)
    }

    fn parse(&mut self, sql: &str) -> Result<Option<ParsedToken>> {
        self.inner.parse(sql)
    }

    fn extracted_parameters(&self) -> Vec<Value> {
        self.inner.extracted_parameters()
    }

    fn set_real_param_types(&mut self, types: &[DataType]) -> Result<()> {
        self.inner.set_real_param_types(types)
    }

    fn plan(&mut self, sql: &str, options: &PlanOptions) -> Result<Option<CompiledPlan>> {
        self.plans.fetch_add(1, Ordering::SeqCst);
        self.inner.plan(sql, options)
    }

    fn last_error_message(&self) -> Option<String> {
        self.inner.last_error_message()
    }

    fn compiled_as_parameterized_plan(&self) -> bool {
        self.inner.compiled_as_parameterized_plan()
    }
}

pub fn counting_planner(catalog_version: u64) -> (PlannerTool<CountingEngine>, Arc<AtomicUsize>) {
    let catalog = catalog();
    let plans = Arc::new(AtomicUsize::new(0));
    let engine = CountingEngine {
        inner: EmbeddedSqlEngine::new(Arc::clone(&catalog)),
        plans: Arc::clone(&plans),
    };
    let tool = PlannerTool::with_capability(
        cluster(),
        catalog,
        catalog_version,
        PlannerConfig::default(),
        engine,
    )
    .unwrap();
    (tool, plans)
}

pub fn plan_count(plans: &AtomicUsize) -> usize {
    plans.load(Ordering::SeqCst)
}

/// An engine whose planner fails without saying why.
pub struct SilentEngine {
    inner: EmbeddedSqlEngine,
}

impl SilentEngine {
    pub fn new(catalog: Arc<Database>) -> Self {
        Self {
            inner: EmbeddedSqlEngine::new(catalog),
        }
    }
}

impl EmbeddedSqlCapability for SilentEngine {
    fn ingest_ddl(&mut self, statement: &str) -> Result<()> {
        self.inner.ingest_ddl(statement)
    }

    fn parse(&mut self, sql: &str) -> Result<Option<ParsedToken>> {
        self.inner.parse(sql)
    }

    fn extracted_parameters(&self) -> Vec<Value> {
        self.inner.extracted_parameters()
    }

    fn set_real_param_types(&mut self, types: &[DataType]) -> Result<()> {
        self.inner.set_real_param_types(types)
    }

    fn plan(&mut self, _sql: &str, _options: &PlanOptions) -> Result<Option<CompiledPlan>> {
        Ok(None)
    }

    fn last_error_message(&self) -> Option<String> {
        None
    }

    fn compiled_as_parameterized_plan(&self) -> bool {
        false
    }
}
