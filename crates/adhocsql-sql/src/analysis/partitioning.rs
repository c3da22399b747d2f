use adhocsql_catalog::Database;
use rustc_hash::FxHashMap;

use crate::plan::{
    BinaryOp, JoinType, PartitionValue, PartitioningAnalysis, PlanExpr, PlanNode, PlanNodeKind,
};

type ColumnKey = (String, String);

/// Column equivalence classes built from equality predicates, each class
/// optionally bound to the value its columns must equal.
#[derive(Debug, Default)]
struct EquivalenceClasses {
    index: FxHashMap<ColumnKey, usize>,
    parent: Vec<usize>,
    values: Vec<Option<PartitionValue>>,
}

impl EquivalenceClasses {
    fn class_of(&mut self, key: &ColumnKey) -> usize {
        if let Some(&id) = self.index.get(key) {
            return self.root(id);
        }
        let id = self.parent.len();
        self.parent.push(id);
        self.values.push(None);
        self.index.insert(key.clone(), id);
        id
    }

    fn find(&self, key: &ColumnKey) -> Option<usize> {
        self.index.get(key).map(|&id| self.root(id))
    }

    fn root(&self, mut id: usize) -> usize {
        while self.parent[id] != id {
            id = self.parent[id];
        }
        id
    }

    fn union(&mut self, a: &ColumnKey, b: &ColumnKey) {
        let ra = self.class_of(a);
        let rb = self.class_of(b);
        if ra == rb {
            return;
        }
        self.parent[rb] = ra;
        if self.values[ra].is_none() {
            self.values[ra] = self.values[rb].take();
        }
    }

    fn bind(&mut self, key: &ColumnKey, value: PartitionValue) {
        let root = self.class_of(key);
        if self.values[root].is_none() {
            self.values[root] = Some(value);
        }
    }
}

fn column_key(expr: &PlanExpr) -> Option<ColumnKey> {
    match expr {
        PlanExpr::Column {
            qualifier, name, ..
        } => Some((qualifier.clone(), name.clone())),
        _ => None,
    }
}

fn value_of(expr: &PlanExpr) -> Option<PartitionValue> {
    match expr {
        PlanExpr::Parameter { index } => Some(PartitionValue::Parameter(*index)),
        PlanExpr::Literal(value) if !value.is_null() => Some(PartitionValue::Constant(value.clone())),
        _ => None,
    }
}

/// Feeds `col = col` and `col = value` conjuncts of `predicate` into the
/// classes. Value bindings are skipped when `bind_values` is false.
fn absorb(classes: &mut EquivalenceClasses, predicate: &PlanExpr, bind_values: bool) {
    for conjunct in predicate.conjuncts() {
        let PlanExpr::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        } = conjunct
        else {
            continue;
        };
        match (column_key(left), column_key(right)) {
            (Some(l), Some(r)) => classes.union(&l, &r),
            (Some(col), None) if bind_values => {
                if let Some(value) = value_of(right) {
                    classes.bind(&col, value);
                }
            }
            (None, Some(col)) if bind_values => {
                if let Some(value) = value_of(left) {
                    classes.bind(&col, value);
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct Collected<'p> {
    scans: Vec<(&'p str, &'p str)>,
    write_target: Option<&'p str>,
    insert_values: Option<(&'p [String], &'p [Vec<PlanExpr>])>,
    insert_from_query: bool,
}

fn collect<'p>(
    node: &'p PlanNode,
    classes: &mut EquivalenceClasses,
    above_aggregate: bool,
    out: &mut Collected<'p>,
) {
    let mut child_above_aggregate = above_aggregate;
    match &node.kind {
        PlanNodeKind::SeqScan { table, qualifier }
        | PlanNodeKind::IndexScan {
            table, qualifier, ..
        } => out.scans.push((table.as_str(), qualifier.as_str())),
        PlanNodeKind::Filter { predicate } if !above_aggregate => {
            absorb(classes, predicate, true);
        }
        PlanNodeKind::Filter { .. } => {}
        PlanNodeKind::Aggregate { .. } => child_above_aggregate = false,
        PlanNodeKind::NestLoop {
            join_type,
            condition: Some(condition),
        } => {
            let inner = matches!(join_type, JoinType::Inner | JoinType::Cross);
            absorb(classes, condition, inner);
        }
        PlanNodeKind::Insert { table, columns } => {
            out.write_target = Some(table.as_str());
            match node.children.first().map(|c| &c.kind) {
                Some(PlanNodeKind::Values { rows }) => {
                    out.insert_values = Some((columns.as_slice(), rows.as_slice()));
                }
                _ => out.insert_from_query = true,
            }
        }
        PlanNodeKind::Update { table, .. } | PlanNodeKind::Delete { table } => {
            out.write_target = Some(table.as_str());
        }
        _ => {}
    }

    for child in &node.children {
        collect(child, classes, child_above_aggregate, out);
    }
}

/// Decides whether every partitioned table the statement touches is pinned
/// to one partition by a single value, and which value that is.
pub fn analyze(root: &PlanNode, catalog: &Database, read_only: bool) -> PartitioningAnalysis {
    let mut classes = EquivalenceClasses::default();
    let mut collected = Collected::default();
    let has_aggregate = root
        .find(|k| matches!(k, PlanNodeKind::Aggregate { .. }))
        .is_some();
    collect(root, &mut classes, has_aggregate, &mut collected);

    let mut analysis = PartitioningAnalysis {
        read_only,
        ..Default::default()
    };

    let mut touched: Vec<&str> = collected.scans.iter().map(|(t, _)| *t).collect();
    touched.extend(collected.write_target);
    for table in touched {
        let list = match catalog.table(table) {
            Some(t) if !t.is_replicated() => &mut analysis.partitioned_tables,
            _ => &mut analysis.replicated_tables,
        };
        if !list.iter().any(|t| t == table) {
            list.push(table.to_string());
        }
    }

    if let Some(target) = collected.write_target {
        let Some(table) = catalog.table(target) else {
            return analysis;
        };
        let Some(partition_column) = table.partition_column() else {
            return analysis;
        };

        if let Some((columns, rows)) = collected.insert_values {
            if let ([row], Some(position)) = (
                rows,
                columns.iter().position(|c| *c == partition_column.name),
            ) {
                analysis.partition_value = row.get(position).and_then(value_of);
            }
            return analysis;
        }
        if collected.insert_from_query {
            return analysis;
        }
    }

    let mut bound: Option<usize> = None;
    for (table, qualifier) in &collected.scans {
        let Some(partition_column) = catalog.table(table).and_then(|t| t.partition_column()) else {
            continue;
        };
        let key = (qualifier.to_string(), partition_column.name.clone());
        let Some(class) = classes.find(&key) else {
            return analysis;
        };
        match bound {
            None => bound = Some(class),
            Some(existing) if existing == class => {}
            Some(_) => return analysis,
        }
    }

    analysis.partition_value = bound.and_then(|class| classes.values[class].clone());
    analysis
}
