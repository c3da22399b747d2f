use adhocsql_catalog::Cluster;
use adhocsql_common::types::Value;
use adhocsql_sql::{PartitionValue, PartitioningAnalysis};

use crate::statement::Routing;

/// Which statement kinds may be routed to one partition by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceHints {
    pub reads: bool,
    pub writes: bool,
}

impl InferenceHints {
    pub fn uniform(infer: bool) -> Self {
        Self {
            reads: infer,
            writes: infer,
        }
    }

    fn permits(&self, read_only: bool) -> bool {
        if read_only { self.reads } else { self.writes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitioningDecision {
    /// The caller named the partition key.
    Explicit(Value),
    /// The plan pins every partitioned table to one value.
    Inferred(PartitionValue),
    MultiPartition,
}

impl PartitioningDecision {
    /// The parameter a cached plan reads its partition key from.
    pub fn parameter_index(&self) -> Option<usize> {
        match self {
            PartitioningDecision::Inferred(PartitionValue::Parameter(index)) => Some(*index),
            _ => None,
        }
    }

    /// Whether the key can be recomputed from fresh parameter values alone.
    pub fn is_reusable(&self) -> bool {
        !matches!(
            self,
            PartitioningDecision::Explicit(_)
                | PartitioningDecision::Inferred(PartitionValue::Constant(_))
        )
    }

    /// The concrete partition key for one invocation.
    pub fn resolve(&self, parameters: &[Value]) -> Option<Value> {
        match self {
            PartitioningDecision::Explicit(value) => Some(value.clone()),
            PartitioningDecision::Inferred(PartitionValue::Parameter(index)) => {
                parameters.get(*index).cloned()
            }
            PartitioningDecision::Inferred(PartitionValue::Constant(value)) => Some(value.clone()),
            PartitioningDecision::MultiPartition => None,
        }
    }
}

/// Turns an optional caller-supplied key and the planner's partitioning
/// analysis into a routing decision.
#[derive(Debug, Clone)]
pub struct PartitioningAdvisor {
    cluster: Cluster,
}

impl PartitioningAdvisor {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn decide(
        &self,
        partition_param: Option<&Value>,
        hints: InferenceHints,
        analysis: &PartitioningAnalysis,
    ) -> PartitioningDecision {
        if let Some(value) = partition_param {
            return PartitioningDecision::Explicit(value.clone());
        }
        match &analysis.partition_value {
            Some(value) if hints.permits(analysis.read_only) => {
                PartitioningDecision::Inferred(value.clone())
            }
            _ => PartitioningDecision::MultiPartition,
        }
    }

    /// Routing for a resolved partition key. NULL keys fan out.
    pub fn route(&self, key: Option<&Value>) -> Routing {
        match key {
            Some(value) if !value.is_null() => {
                Routing::SinglePartition(self.cluster.partition_for(value))
            }
            _ => Routing::MultiPartition,
        }
    }
}
