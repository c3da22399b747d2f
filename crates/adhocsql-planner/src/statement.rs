use std::sync::Arc;

use adhocsql_catalog::PartitionId;
use adhocsql_common::types::{DataType, ParameterSet, Value};
use adhocsql_sql::PlanNode;

/// The literal-independent part of a compiled statement, shared by every
/// statement with the same parsed token.
#[derive(Debug, Clone, PartialEq)]
pub struct CorePlan {
    pub root: Arc<PlanNode>,
    pub parameter_types: Vec<DataType>,
    /// Parameter that carries the partition key, if the plan is routed by one.
    pub partitioning_param_index: Option<usize>,
    pub read_only: bool,
    pub nondeterminism_detail: Option<String>,
    pub catalog_version: u64,
}

impl CorePlan {
    pub fn is_content_deterministic(&self) -> bool {
        self.nondeterminism_detail.is_none()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routing {
    SinglePartition(PartitionId),
    MultiPartition,
}

impl Routing {
    pub fn is_single_partition(&self) -> bool {
        matches!(self, Routing::SinglePartition(_))
    }
}

/// A planned ad hoc statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct AdHocPlannedStatement {
    pub sql: String,
    pub core: Arc<CorePlan>,
    pub parameters: ParameterSet,
    /// Partition key, absent for multi-partition statements.
    pub partition_param: Option<Value>,
    pub routing: Routing,
    pub catalog_version: u64,
}

impl AdHocPlannedStatement {
    pub fn sql_bytes(&self) -> &[u8] {
        self.sql.as_bytes()
    }

    pub fn is_single_partition(&self) -> bool {
        self.routing.is_single_partition()
    }

    pub fn explain(&self) -> String {
        self.core.root.explain()
    }
}
