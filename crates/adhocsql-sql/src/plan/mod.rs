mod expr;
mod node;

use adhocsql_common::types::{DataType, Value};
pub use expr::{AggregateFunc, BinaryOp, PlanExpr, UnaryOp};
pub use node::{
    JoinType, OutputColumn, PlanNode, PlanNodeId, PlanNodeIdGenerator, PlanNodeKind, SortKey,
};

/// Where a single-partition statement finds its partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionValue {
    /// Supplied by the parameter at this index on every invocation.
    Parameter(usize),
    /// Baked into the statement text.
    Constant(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitioningAnalysis {
    pub read_only: bool,
    pub partitioned_tables: Vec<String>,
    pub replicated_tables: Vec<String>,
    pub partition_value: Option<PartitionValue>,
}

impl PartitioningAnalysis {
    pub fn is_single_partition_capable(&self) -> bool {
        self.partition_value.is_some()
    }

    pub fn partition_parameter_index(&self) -> Option<usize> {
        match self.partition_value {
            Some(PartitionValue::Parameter(index)) => Some(index),
            _ => None,
        }
    }
}

/// A fully planned statement for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    pub sql: String,
    pub root: PlanNode,
    /// Formal parameter types, in parameter order.
    pub parameters: Vec<DataType>,
    /// Literal values lifted out of the statement text, coerced to
    /// `parameters`. Empty when the statement was compiled unparameterized
    /// or carries user placeholders.
    pub extracted_param_values: Vec<Value>,
    pub read_only: bool,
    pub partitioning: PartitioningAnalysis,
    pub content_deterministic: bool,
    pub nondeterminism_detail: Option<String>,
}

impl CompiledPlan {
    pub fn is_content_deterministic(&self) -> bool {
        self.content_deterministic
    }

    pub fn nondeterminism_detail(&self) -> Option<&str> {
        self.nondeterminism_detail.as_deref()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}
