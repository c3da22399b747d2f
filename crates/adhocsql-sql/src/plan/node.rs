use std::fmt;

use super::expr::PlanExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanNodeId(pub u32);

impl fmt::Display for PlanNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out plan-node ids for a single compilation.
///
/// Every compile owns its own generator, so concurrent compiles never share
/// a counter and a given statement always numbers its nodes the same way.
#[derive(Debug)]
pub struct PlanNodeIdGenerator {
    next: u32,
}

impl PlanNodeIdGenerator {
    pub const FIRST_ID: u32 = 1;

    pub fn new() -> Self {
        Self {
            next: Self::FIRST_ID,
        }
    }

    pub fn next_id(&mut self) -> PlanNodeId {
        let id = PlanNodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for PlanNodeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputColumn {
    pub name: String,
    pub expr: PlanExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub expr: PlanExpr,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanNodeKind {
    SeqScan {
        table: String,
        qualifier: String,
    },
    IndexScan {
        table: String,
        qualifier: String,
        index: String,
        search_keys: Vec<PlanExpr>,
    },
    NestLoop {
        join_type: JoinType,
        condition: Option<PlanExpr>,
    },
    Filter {
        predicate: PlanExpr,
    },
    Aggregate {
        group_by: Vec<PlanExpr>,
        aggregates: Vec<PlanExpr>,
    },
    Projection {
        columns: Vec<OutputColumn>,
    },
    Distinct,
    OrderBy {
        keys: Vec<SortKey>,
    },
    Limit {
        limit: Option<u64>,
        offset: u64,
    },
    Values {
        rows: Vec<Vec<PlanExpr>>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
    },
    Update {
        table: String,
        assignments: Vec<(String, PlanExpr)>,
    },
    Delete {
        table: String,
    },
}

impl PlanNodeKind {
    fn label(&self) -> String {
        match self {
            PlanNodeKind::SeqScan { table, qualifier } => {
                if table == qualifier {
                    format!("SEQSCAN {}", table)
                } else {
                    format!("SEQSCAN {} AS {}", table, qualifier)
                }
            }
            PlanNodeKind::IndexScan {
                table,
                index,
                search_keys,
                ..
            } => {
                let keys: Vec<String> = search_keys.iter().map(|k| k.to_string()).collect();
                format!("INDEXSCAN {} USING {} [{}]", table, index, keys.join(", "))
            }
            PlanNodeKind::NestLoop {
                join_type,
                condition,
            } => match condition {
                Some(cond) => format!("NESTLOOP {:?} ON {}", join_type, cond),
                None => format!("NESTLOOP {:?}", join_type),
            },
            PlanNodeKind::Filter { predicate } => format!("FILTER {}", predicate),
            PlanNodeKind::Aggregate {
                group_by,
                aggregates,
            } => {
                let groups: Vec<String> = group_by.iter().map(|e| e.to_string()).collect();
                let aggs: Vec<String> = aggregates.iter().map(|e| e.to_string()).collect();
                format!(
                    "AGGREGATE [{}] GROUP BY [{}]",
                    aggs.join(", "),
                    groups.join(", ")
                )
            }
            PlanNodeKind::Projection { columns } => {
                let cols: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
                format!("PROJECTION [{}]", cols.join(", "))
            }
            PlanNodeKind::Distinct => "DISTINCT".to_string(),
            PlanNodeKind::OrderBy { keys } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!("{} {}", k.expr, if k.ascending { "ASC" } else { "DESC" })
                    })
                    .collect();
                format!("ORDERBY [{}]", keys.join(", "))
            }
            PlanNodeKind::Limit { limit, offset } => match limit {
                Some(limit) => format!("LIMIT {} OFFSET {}", limit, offset),
                None => format!("OFFSET {}", offset),
            },
            PlanNodeKind::Values { rows } => format!("VALUES ({} rows)", rows.len()),
            PlanNodeKind::Insert { table, .. } => format!("INSERT {}", table),
            PlanNodeKind::Update { table, .. } => format!("UPDATE {}", table),
            PlanNodeKind::Delete { table } => format!("DELETE {}", table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanNode {
    pub id: PlanNodeId,
    pub kind: PlanNodeKind,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn leaf(id: PlanNodeId, kind: PlanNodeKind) -> Self {
        Self {
            id,
            kind,
            children: Vec::new(),
        }
    }

    pub fn unary(id: PlanNodeId, kind: PlanNodeKind, child: PlanNode) -> Self {
        Self {
            id,
            kind,
            children: vec![child],
        }
    }

    /// Visits every node, parents before children.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a PlanNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    pub fn find(&self, pred: impl Fn(&PlanNodeKind) -> bool) -> Option<&PlanNode> {
        let mut found = None;
        self.walk(&mut |node| {
            if found.is_none() && pred(&node.kind) {
                found = Some(node);
            }
        });
        found
    }

    /// Every expression attached to this node, not including children.
    pub fn expressions(&self) -> Vec<&PlanExpr> {
        match &self.kind {
            PlanNodeKind::SeqScan { .. }
            | PlanNodeKind::Distinct
            | PlanNodeKind::Limit { .. }
            | PlanNodeKind::Insert { .. }
            | PlanNodeKind::Delete { .. } => Vec::new(),
            PlanNodeKind::IndexScan { search_keys, .. } => search_keys.iter().collect(),
            PlanNodeKind::NestLoop { condition, .. } => condition.iter().collect(),
            PlanNodeKind::Filter { predicate } => vec![predicate],
            PlanNodeKind::Aggregate {
                group_by,
                aggregates,
            } => group_by.iter().chain(aggregates.iter()).collect(),
            PlanNodeKind::Projection { columns } => columns.iter().map(|c| &c.expr).collect(),
            PlanNodeKind::OrderBy { keys } => keys.iter().map(|k| &k.expr).collect(),
            PlanNodeKind::Values { rows } => rows.iter().flatten().collect(),
            PlanNodeKind::Update { assignments, .. } => {
                assignments.iter().map(|(_, e)| e).collect()
            }
        }
    }

    /// Indented, one node per line, for debugging and test assertions.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} {}\n", self.id, self.kind.label()));
        for child in &self.children {
            child.explain_into(out, depth + 1);
        }
    }
}
