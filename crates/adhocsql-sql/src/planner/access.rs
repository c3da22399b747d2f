use std::cmp::Ordering;

use crate::expr_planner::ScopeTable;
use crate::plan::{BinaryOp, PlanExpr, PlanNode, PlanNodeKind};

use super::Planner;

/// `qualifier.column = <parameter or literal>` conjuncts, keyed by column.
fn equality_bindings<'p>(qualifier: &str, predicate: Option<&'p PlanExpr>) -> Vec<(&'p str, &'p PlanExpr)> {
    let Some(predicate) = predicate else {
        return Vec::new();
    };

    predicate
        .conjuncts()
        .into_iter()
        .filter_map(|conjunct| match conjunct {
            PlanExpr::Binary {
                op: BinaryOp::Eq,
                left,
                right,
            } => column_binding(qualifier, left, right)
                .or_else(|| column_binding(qualifier, right, left)),
            _ => None,
        })
        .collect()
}

fn column_binding<'p>(
    qualifier: &str,
    column: &'p PlanExpr,
    value: &'p PlanExpr,
) -> Option<(&'p str, &'p PlanExpr)> {
    match (column, value) {
        (
            PlanExpr::Column {
                qualifier: q, name, ..
            },
            PlanExpr::Parameter { .. } | PlanExpr::Literal(_),
        ) if q == qualifier && !matches!(value, PlanExpr::Literal(v) if v.is_null()) => {
            Some((name.as_str(), value))
        }
        _ => None,
    }
}

impl Planner<'_> {
    /// Picks the cheapest scan of `table` under the configured cost model.
    ///
    /// Candidates are a sequential scan plus one index scan for each catalog
    /// index whose leading columns are bound by equality in `predicate`.
    pub(super) fn plan_access_path(
        &mut self,
        table: &ScopeTable,
        predicate: Option<&PlanExpr>,
    ) -> PlanNode {
        let id = self.ids.next_id();
        let table_name = table.table.name.clone();
        let qualifier = table.qualifier.clone();

        let mut candidates = vec![PlanNode::leaf(
            id,
            PlanNodeKind::SeqScan {
                table: table_name.clone(),
                qualifier: qualifier.clone(),
            },
        )];

        let bindings = equality_bindings(&qualifier, predicate);
        if let Some(catalog_table) = self.catalog.table(&table_name) {
            for index in catalog_table.indexes() {
                let search_keys: Vec<PlanExpr> = index
                    .columns
                    .iter()
                    .map_while(|column| {
                        bindings
                            .iter()
                            .find(|(name, _)| name == column)
                            .map(|(_, value)| (*value).clone())
                    })
                    .collect();
                if search_keys.is_empty() {
                    continue;
                }
                candidates.push(PlanNode::leaf(
                    id,
                    PlanNodeKind::IndexScan {
                        table: table_name.clone(),
                        qualifier: qualifier.clone(),
                        index: index.name.clone(),
                        search_keys,
                    },
                ));
            }
        }

        let model = self.options.cost_model.clone();
        candidates
            .into_iter()
            .map(|plan| (model.cost(&plan), plan))
            .min_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .map(|(_, plan)| plan)
            .unwrap_or_else(|| {
                PlanNode::leaf(
                    id,
                    PlanNodeKind::SeqScan {
                        table: table_name,
                        qualifier,
                    },
                )
            })
    }
}
