use std::fmt;

use crate::plan::{PlanNode, PlanNodeKind};

/// Ranks candidate access paths. Lower is cheaper.
pub trait CostModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn cost(&self, plan: &PlanNode) -> f64;
}

/// A fixed-weight model with no statistics.
///
/// An index scan beats a sequential scan, and an index scan binding more key
/// columns beats one binding fewer. Equal costs keep the first candidate, so
/// the same statement always gets the same plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialCostModel;

impl TrivialCostModel {
    const SEQ_SCAN: f64 = 100.0;
    const INDEX_SCAN: f64 = 10.0;
    const OTHER: f64 = 1.0;
}

impl CostModel for TrivialCostModel {
    fn name(&self) -> &str {
        "trivial"
    }

    fn cost(&self, plan: &PlanNode) -> f64 {
        let mut total = 0.0;
        plan.walk(&mut |node| {
            total += match &node.kind {
                PlanNodeKind::SeqScan { .. } => Self::SEQ_SCAN,
                PlanNodeKind::IndexScan { search_keys, .. } => {
                    Self::INDEX_SCAN / (search_keys.len().max(1) as f64)
                }
                _ => Self::OTHER,
            };
        });
        total
    }
}
