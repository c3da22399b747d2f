use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::Value;
use sqlparser::ast::{self, SetExpr};

use super::{Planner, base_name, require_single_table, table_object_to_raw_string};
use crate::expr_planner::{ExprPlanner, Scope};
use crate::plan::{PlanExpr, PlanNode, PlanNodeKind};
use crate::schema::SchemaColumn;

/// Checks a value headed for `column` and converts literals to its type.
fn bind_to_column(
    exprs: &mut ExprPlanner<'_>,
    expr: PlanExpr,
    column: &SchemaColumn,
) -> Result<PlanExpr> {
    match expr {
        PlanExpr::Literal(Value::Null) if !column.nullable => Err(Error::invalid_query(format!(
            "column {} is NOT NULL",
            column.name
        ))),
        PlanExpr::Literal(value) => Ok(PlanExpr::Literal(value.coerce_to(&column.data_type)?)),
        other => {
            exprs.hint_exact(&other, column.data_type);
            Ok(other)
        }
    }
}

impl Planner<'_> {
    pub(super) fn plan_insert(&mut self, insert: &ast::Insert) -> Result<PlanNode> {
        let table_name = table_object_to_raw_string(&insert.table);
        let table_name = table_name.rsplit('.').next().unwrap_or_default().to_uppercase();
        let table = self
            .schema
            .table(&table_name)
            .ok_or_else(|| Error::table_not_found(&table_name))?
            .clone();

        let columns: Vec<SchemaColumn> = if insert.columns.is_empty() {
            table.columns.clone()
        } else {
            let mut columns: Vec<SchemaColumn> = Vec::with_capacity(insert.columns.len());
            for ident in &insert.columns {
                let column = table.column(&ident.value).ok_or_else(|| {
                    Error::column_not_found(format!("{}.{}", table_name, ident.value.to_uppercase()))
                })?;
                if columns.iter().any(|c| c.name == column.name) {
                    return Err(Error::invalid_query(format!(
                        "column {} is specified more than once",
                        column.name
                    )));
                }
                columns.push(column.clone());
            }
            columns
        };

        if let Some(missing) = table
            .columns
            .iter()
            .find(|c| !c.nullable && !columns.iter().any(|i| i.name == c.name))
        {
            return Err(Error::invalid_query(format!(
                "column {} is NOT NULL and has no value",
                missing.name
            )));
        }

        let source = insert
            .source
            .as_ref()
            .ok_or_else(|| Error::parse_error("INSERT requires a source"))?;

        let child = match source.body.as_ref() {
            SetExpr::Values(values) => {
                let scope = Scope::new();
                let mut exprs = ExprPlanner::new(&scope, &mut self.params);
                let mut rows = Vec::with_capacity(values.rows.len());
                for row in &values.rows {
                    if row.len() != columns.len() {
                        return Err(Error::invalid_query(format!(
                            "INSERT has {} target columns but {} values",
                            columns.len(),
                            row.len()
                        )));
                    }
                    let mut planned = Vec::with_capacity(row.len());
                    for (expr, column) in row.iter().zip(&columns) {
                        let expr = exprs.plan(expr)?;
                        planned.push(bind_to_column(&mut exprs, expr, column)?);
                    }
                    rows.push(planned);
                }
                PlanNode::leaf(self.ids.next_id(), PlanNodeKind::Values { rows })
            }
            _ => {
                let plan = self.plan_query(source)?;
                if let PlanNodeKind::Projection { columns: output } = &projection_of(&plan).kind
                    && output.len() != columns.len()
                {
                    return Err(Error::invalid_query(format!(
                        "INSERT has {} target columns but the query returns {}",
                        columns.len(),
                        output.len()
                    )));
                }
                plan
            }
        };

        Ok(self.node(
            PlanNodeKind::Insert {
                table: table_name,
                columns: columns.into_iter().map(|c| c.name).collect(),
            },
            child,
        ))
    }

    pub(super) fn plan_update(
        &mut self,
        table: &ast::TableWithJoins,
        assignments: &[ast::Assignment],
        has_from: bool,
        selection: Option<&ast::Expr>,
    ) -> Result<PlanNode> {
        if has_from {
            return Err(Error::unsupported("UPDATE ... FROM"));
        }
        let relation = require_single_table(std::slice::from_ref(table), "UPDATE")?;

        let mut scope = Scope::new();
        let qualifier = self.add_to_scope(&mut scope, &relation)?;
        let Some(target) = scope.by_qualifier(&qualifier).cloned() else {
            return Err(Error::internal("UPDATE target missing from scope"));
        };

        let mut exprs = ExprPlanner::new(&scope, &mut self.params);
        let mut planned = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let name = match &assignment.target {
                ast::AssignmentTarget::ColumnName(name) => base_name(name),
                ast::AssignmentTarget::Tuple(_) => {
                    return Err(Error::unsupported("tuple assignment in UPDATE"));
                }
            };
            let column = target.table.column(&name).cloned().ok_or_else(|| {
                Error::column_not_found(format!("{}.{}", target.table.name, name))
            })?;
            let partition_column = self
                .catalog
                .table(&target.table.name)
                .and_then(|t| t.partition_column());
            if partition_column.is_some_and(|p| p.name == column.name) {
                return Err(Error::invalid_query(format!(
                    "partition column {}.{} cannot be updated",
                    target.table.name, column.name
                )));
            }
            if planned.iter().any(|(n, _): &(String, PlanExpr)| *n == column.name) {
                return Err(Error::invalid_query(format!(
                    "column {} is assigned more than once",
                    column.name
                )));
            }
            let value = exprs.plan(&assignment.value)?;
            planned.push((column.name.clone(), bind_to_column(&mut exprs, value, &column)?));
        }
        let filter = selection.map(|e| exprs.plan(e)).transpose()?;
        drop(exprs);

        let mut plan = self.plan_access_path(&target, filter.as_ref());
        if let Some(predicate) = filter {
            plan = self.node(PlanNodeKind::Filter { predicate }, plan);
        }
        Ok(self.node(
            PlanNodeKind::Update {
                table: target.table.name.clone(),
                assignments: planned,
            },
            plan,
        ))
    }

    pub(super) fn plan_delete(&mut self, delete: &ast::Delete) -> Result<PlanNode> {
        let tables = match &delete.from {
            ast::FromTable::WithFromKeyword(tables) => tables,
            ast::FromTable::WithoutKeyword(tables) => tables,
        };
        let relation = require_single_table(tables, "DELETE")?;

        let mut scope = Scope::new();
        let qualifier = self.add_to_scope(&mut scope, &relation)?;
        let Some(target) = scope.by_qualifier(&qualifier).cloned() else {
            return Err(Error::internal("DELETE target missing from scope"));
        };

        let filter = {
            let mut exprs = ExprPlanner::new(&scope, &mut self.params);
            delete
                .selection
                .as_ref()
                .map(|e| exprs.plan(e))
                .transpose()?
        };

        let mut plan = self.plan_access_path(&target, filter.as_ref());
        if let Some(predicate) = filter {
            plan = self.node(PlanNodeKind::Filter { predicate }, plan);
        }
        Ok(self.node(
            PlanNodeKind::Delete {
                table: target.table.name.clone(),
            },
            plan,
        ))
    }
}

/// The projection under any LIMIT, DISTINCT or ORDER BY nodes of a query.
fn projection_of(plan: &PlanNode) -> &PlanNode {
    match (&plan.kind, plan.children.first()) {
        (
            PlanNodeKind::Limit { .. } | PlanNodeKind::Distinct | PlanNodeKind::OrderBy { .. },
            Some(child),
        ) => projection_of(child),
        _ => plan,
    }
}

