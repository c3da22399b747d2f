use crate::expr_planner::NONDETERMINISTIC_FUNCTIONS;
use crate::plan::{PlanExpr, PlanNode, PlanNodeKind};

/// Why `root` may produce different content on different replicas, or
/// `None` if it cannot.
pub fn analyze(root: &PlanNode) -> Option<String> {
    let mut detail = None;
    root.walk(&mut |node| {
        if detail.is_some() {
            return;
        }
        if let PlanNodeKind::Limit { .. } = node.kind
            && !node.children.iter().any(is_ordered_or_single_row)
        {
            detail = Some("LIMIT or OFFSET is applied to rows in an unspecified order".to_string());
            return;
        }
        for expr in node.expressions() {
            if let Some(name) = nondeterministic_function(expr) {
                detail = Some(format!("function {} returns a different value on every call", name));
                return;
            }
        }
    });
    detail
}

/// Whether rows reaching a LIMIT arrive in a defined order: an ORDER BY
/// sits below it, or an ungrouped aggregate reduces the input to one row.
fn is_ordered_or_single_row(node: &PlanNode) -> bool {
    node.find(|kind| match kind {
        PlanNodeKind::OrderBy { .. } => true,
        PlanNodeKind::Aggregate { group_by, .. } => group_by.is_empty(),
        _ => false,
    })
    .is_some()
}

fn nondeterministic_function(expr: &PlanExpr) -> Option<String> {
    let mut found = None;
    expr.walk(&mut |e| {
        if found.is_none()
            && let PlanExpr::Function { name, .. } = e
            && NONDETERMINISTIC_FUNCTIONS.contains(&name.as_str())
        {
            found = Some(name.clone());
        }
    });
    found
}
