use adhocsql_common::error::{Error, Result};
use sqlparser::ast::{self, JoinOperator, SelectItem, SetExpr};

use super::Planner;
use crate::expr_planner::{ExprPlanner, Scope};
use crate::parameterize::join_condition;
use crate::plan::{JoinType, OutputColumn, PlanExpr, PlanNode, PlanNodeKind, SortKey};

struct JoinSpec {
    join_type: JoinType,
    condition: Option<PlanExpr>,
}

/// How the second and later FROM tables attach to the tables before them.
type JoinClauses<'q> = Vec<(JoinType, Option<&'q ast::Expr>)>;

impl Planner<'_> {
    pub(super) fn plan_query(&mut self, query: &ast::Query) -> Result<PlanNode> {
        if query.with.is_some() {
            return Err(Error::unsupported("WITH clauses in ad hoc queries"));
        }
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            SetExpr::Query(inner) if query.order_by.is_none() && query.limit_clause.is_none() => {
                return self.plan_query(inner);
            }
            SetExpr::SetOperation { op, .. } => {
                return Err(Error::unsupported(format!("{} in ad hoc queries", op)));
            }
            other => return Err(Error::unsupported(format!("query body {}", other))),
        };

        let (scope, join_clauses) = self.build_scope(&select.from)?;
        let distinct = match &select.distinct {
            None => false,
            Some(ast::Distinct::Distinct) => true,
            Some(other) => return Err(Error::unsupported(format!("{}", other))),
        };

        let mut exprs = ExprPlanner::new(&scope, &mut self.params);

        // Textual order, so `?` placeholders number the way they read.
        exprs.set_allow_aggregates(true);
        let mut projection = Vec::with_capacity(select.projection.len());
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    let planned = exprs.plan(expr)?;
                    let name = match &planned {
                        PlanExpr::Column { name, .. } => name.clone(),
                        _ => expr.to_string().to_uppercase(),
                    };
                    projection.push(OutputColumn {
                        name,
                        expr: planned,
                    });
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    projection.push(OutputColumn {
                        name: alias.value.to_uppercase(),
                        expr: exprs.plan(expr)?,
                    });
                }
                SelectItem::Wildcard(_) => {
                    for (name, expr) in scope.wildcard(None)? {
                        projection.push(OutputColumn { name, expr });
                    }
                }
                SelectItem::QualifiedWildcard(kind, _) => {
                    let qualifier = kind.to_string();
                    for (name, expr) in scope.wildcard(Some(&qualifier))? {
                        projection.push(OutputColumn { name, expr });
                    }
                }
            }
        }

        exprs.set_allow_aggregates(false);
        let mut joins = Vec::with_capacity(join_clauses.len());
        for (join_type, condition) in &join_clauses {
            joins.push(JoinSpec {
                join_type: *join_type,
                condition: condition.map(|e| exprs.plan(e)).transpose()?,
            });
        }

        let filter = select
            .selection
            .as_ref()
            .map(|e| exprs.plan(e))
            .transpose()?;

        let group_by = match &select.group_by {
            ast::GroupByExpr::Expressions(list, _) => list
                .iter()
                .map(|e| exprs.plan(e))
                .collect::<Result<Vec<_>>>()?,
            ast::GroupByExpr::All(_) => {
                return Err(Error::unsupported("GROUP BY ALL"));
            }
        };

        exprs.set_allow_aggregates(true);
        let having = select
            .having
            .as_ref()
            .map(|e| exprs.plan(e))
            .transpose()?;

        let mut order_keys = Vec::new();
        if let Some(order_by) = &query.order_by {
            let items = match &order_by.kind {
                ast::OrderByKind::Expressions(items) => items,
                ast::OrderByKind::All(_) => return Err(Error::unsupported("ORDER BY ALL")),
            };
            for item in items {
                let expr = match output_reference(&item.expr, &projection)? {
                    Some(expr) => expr,
                    None => exprs.plan(&item.expr)?,
                };
                order_keys.push(SortKey {
                    expr,
                    ascending: item.options.asc.unwrap_or(true),
                });
            }
        }
        drop(exprs);

        let (limit, offset) = limit_offset(query.limit_clause.as_ref())?;
        let aggregates = collect_aggregates(
            projection
                .iter()
                .map(|c| &c.expr)
                .chain(having.iter())
                .chain(order_keys.iter().map(|k| &k.expr)),
        );
        if !aggregates.is_empty() || !group_by.is_empty() {
            check_grouping(&projection, &group_by)?;
        } else if having.is_some() {
            return Err(Error::invalid_query("HAVING requires GROUP BY or an aggregate"));
        }

        let mut plan = self.plan_join_tree(&scope, joins, filter.as_ref())?;
        if let Some(predicate) = filter {
            plan = self.node(PlanNodeKind::Filter { predicate }, plan);
        }
        if !aggregates.is_empty() || !group_by.is_empty() {
            plan = self.node(
                PlanNodeKind::Aggregate {
                    group_by,
                    aggregates,
                },
                plan,
            );
        }
        if let Some(predicate) = having {
            plan = self.node(PlanNodeKind::Filter { predicate }, plan);
        }
        if !order_keys.is_empty() {
            plan = self.node(PlanNodeKind::OrderBy { keys: order_keys }, plan);
        }
        plan = self.node(PlanNodeKind::Projection { columns: projection }, plan);
        if distinct {
            plan = self.node(PlanNodeKind::Distinct, plan);
        }
        if limit.is_some() || offset > 0 {
            plan = self.node(PlanNodeKind::Limit { limit, offset }, plan);
        }
        Ok(plan)
    }

    /// Collects every FROM table into one scope, left to right, and the
    /// operators joining the second and later tables.
    fn build_scope<'q>(&self, from: &'q [ast::TableWithJoins]) -> Result<(Scope, JoinClauses<'q>)> {
        if from.is_empty() {
            return Err(Error::unsupported("SELECT without FROM"));
        }

        let table_count: usize = from.iter().map(|t| 1 + t.joins.len()).sum();
        self.check_join_limit(table_count)?;

        let mut scope = Scope::new();
        let mut clauses = Vec::with_capacity(table_count.saturating_sub(1));
        for (i, table) in from.iter().enumerate() {
            self.add_to_scope(&mut scope, &table.relation)?;
            if i > 0 {
                clauses.push((JoinType::Cross, None));
            }
            for join in &table.joins {
                self.add_to_scope(&mut scope, &join.relation)?;
                clauses.push((
                    join_type(&join.join_operator)?,
                    join_condition(&join.join_operator),
                ));
            }
        }
        Ok((scope, clauses))
    }

    /// Left-deep nested loops over the scope's tables.
    fn plan_join_tree(
        &mut self,
        scope: &Scope,
        joins: Vec<JoinSpec>,
        filter: Option<&PlanExpr>,
    ) -> Result<PlanNode> {
        let mut tables = scope.tables().iter();
        let first = tables
            .next()
            .ok_or_else(|| Error::internal("no tables to scan"))?;
        let mut plan = self.plan_access_path(first, filter);

        for (table, join) in tables.zip(joins) {
            let inner = self.plan_access_path(table, filter);
            plan = PlanNode {
                id: self.ids.next_id(),
                kind: PlanNodeKind::NestLoop {
                    join_type: join.join_type,
                    condition: join.condition,
                },
                children: vec![plan, inner],
            };
        }
        Ok(plan)
    }
}

fn join_type(op: &JoinOperator) -> Result<JoinType> {
    match op {
        JoinOperator::Join(_) | JoinOperator::Inner(_) => Ok(JoinType::Inner),
        JoinOperator::Left(_) | JoinOperator::LeftOuter(_) => Ok(JoinType::Left),
        JoinOperator::Right(_) | JoinOperator::RightOuter(_) => Ok(JoinType::Right),
        JoinOperator::FullOuter(_) => Ok(JoinType::Full),
        JoinOperator::CrossJoin(_) => Ok(JoinType::Cross),
        _ => Err(Error::unsupported("join type")),
    }
}

/// `ORDER BY 2` or `ORDER BY alias` refer to an output column.
fn output_reference(expr: &ast::Expr, projection: &[OutputColumn]) -> Result<Option<PlanExpr>> {
    match expr {
        ast::Expr::Value(v) => match &v.value {
            ast::Value::Number(text, _) => {
                let position = text
                    .parse::<usize>()
                    .ok()
                    .filter(|p| (1..=projection.len()).contains(p))
                    .ok_or_else(|| {
                        Error::invalid_query(format!("ORDER BY position {} is out of range", text))
                    })?;
                Ok(Some(projection[position - 1].expr.clone()))
            }
            _ => Ok(None),
        },
        ast::Expr::Identifier(ident) => Ok(projection
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&ident.value))
            .map(|c| c.expr.clone())),
        _ => Ok(None),
    }
}

fn limit_offset(clause: Option<&ast::LimitClause>) -> Result<(Option<u64>, u64)> {
    let (limit, offset) = match clause {
        None => return Ok((None, 0)),
        Some(ast::LimitClause::LimitOffset { limit, offset, .. }) => {
            (limit.as_ref(), offset.as_ref().map(|o| &o.value))
        }
        Some(ast::LimitClause::OffsetCommaLimit { offset, limit }) => (Some(limit), Some(offset)),
    };

    let limit = limit.map(constant_count).transpose()?;
    let offset = offset.map(constant_count).transpose()?.unwrap_or(0);
    Ok((limit, offset))
}

fn constant_count(expr: &ast::Expr) -> Result<u64> {
    if let ast::Expr::Value(v) = expr
        && let ast::Value::Number(text, _) = &v.value
    {
        return text
            .parse::<u64>()
            .map_err(|_| Error::invalid_query(format!("invalid LIMIT or OFFSET {}", text)));
    }
    Err(Error::unsupported(format!(
        "LIMIT or OFFSET must be a constant, found {}",
        expr
    )))
}

fn collect_aggregates<'e>(exprs: impl Iterator<Item = &'e PlanExpr>) -> Vec<PlanExpr> {
    let mut out: Vec<PlanExpr> = Vec::new();
    for expr in exprs {
        expr.walk(&mut |e| {
            if matches!(e, PlanExpr::Aggregate { .. }) && !out.contains(e) {
                out.push(e.clone());
            }
        });
    }
    out
}

/// Outside aggregates, an aggregated query may only project grouping
/// expressions or columns that appear in them.
fn check_grouping(projection: &[OutputColumn], group_by: &[PlanExpr]) -> Result<()> {
    for column in projection {
        if group_by.contains(&column.expr) {
            continue;
        }
        for bare in columns_outside_aggregates(&column.expr) {
            if !group_by.iter().any(|g| g == bare) {
                return Err(Error::invalid_query(format!(
                    "{} must appear in GROUP BY or be used in an aggregate",
                    bare
                )));
            }
        }
    }
    Ok(())
}

fn columns_outside_aggregates(expr: &PlanExpr) -> Vec<&PlanExpr> {
    match expr {
        PlanExpr::Column { .. } => vec![expr],
        PlanExpr::Aggregate { .. } | PlanExpr::Literal(_) | PlanExpr::Parameter { .. } => {
            Vec::new()
        }
        PlanExpr::Binary { left, right, .. } => {
            let mut out = columns_outside_aggregates(left);
            out.extend(columns_outside_aggregates(right));
            out
        }
        PlanExpr::Unary { expr, .. } | PlanExpr::IsNull { expr, .. } => {
            columns_outside_aggregates(expr)
        }
        PlanExpr::InList { expr, list, .. } => {
            let mut out = columns_outside_aggregates(expr);
            for item in list {
                out.extend(columns_outside_aggregates(item));
            }
            out
        }
        PlanExpr::Between {
            expr, low, high, ..
        } => {
            let mut out = columns_outside_aggregates(expr);
            out.extend(columns_outside_aggregates(low));
            out.extend(columns_outside_aggregates(high));
            out
        }
        PlanExpr::Like { expr, pattern, .. } => {
            let mut out = columns_outside_aggregates(expr);
            out.extend(columns_outside_aggregates(pattern));
            out
        }
        PlanExpr::Function { args, .. } => {
            args.iter().flat_map(columns_outside_aggregates).collect()
        }
    }
}
