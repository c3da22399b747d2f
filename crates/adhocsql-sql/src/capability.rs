use std::sync::Arc;

use adhocsql_common::error::Result;
use adhocsql_common::types::{DataType, Value};

use crate::cost::{CostModel, TrivialCostModel};
use crate::plan::CompiledPlan;
use crate::token::ParsedToken;

/// Knobs for one full compile.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub cost_model: Arc<dyn CostModel>,
    /// Maximum number of tables a single statement may join.
    pub joined_table_limit: usize,
}

impl PlanOptions {
    pub fn new(cost_model: Arc<dyn CostModel>, joined_table_limit: usize) -> Self {
        Self {
            cost_model,
            joined_table_limit,
        }
    }

    pub fn trivial(joined_table_limit: usize) -> Self {
        Self::new(Arc::new(TrivialCostModel), joined_table_limit)
    }
}

/// An in-process SQL front end holding its own schema state.
///
/// Implementations are stateful between calls: `extracted_parameters`,
/// `set_real_param_types` and `compiled_as_parameterized_plan` refer to the
/// statement most recently passed to `parse` or `plan`, and
/// `last_error_message` to the most recent `plan`. Callers that share one
/// instance across threads must serialize access to it.
pub trait EmbeddedSqlCapability: Send {
    /// Adds one DDL statement to the schema.
    fn ingest_ddl(&mut self, statement: &str) -> Result<()>;

    /// Parses one DML statement. Returns `Ok(None)` when the statement is
    /// valid but must not share plans with other statements.
    fn parse(&mut self, sql: &str) -> Result<Option<ParsedToken>>;

    /// Literals lifted from the last parsed statement, in placeholder order.
    fn extracted_parameters(&self) -> Vec<Value>;

    /// Re-validates the last extracted literals against the types of a
    /// previously compiled plan, converting them in place.
    fn set_real_param_types(&mut self, types: &[DataType]) -> Result<()>;

    /// Fully compiles `sql`. `Ok(None)` means planning failed and the reason,
    /// if one is known, is available from `last_error_message`.
    fn plan(&mut self, sql: &str, options: &PlanOptions) -> Result<Option<CompiledPlan>>;

    fn last_error_message(&self) -> Option<String>;

    /// Whether the last successful `plan` replaced literals with parameters.
    fn compiled_as_parameterized_plan(&self) -> bool;
}
