use adhocsql_catalog::Database;
use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::Value;
use sqlparser::ast::{self, ObjectName, ObjectNamePart, Statement, TableFactor, TableObject};

use crate::analysis;
use crate::capability::PlanOptions;
use crate::expr_planner::{ParameterTypes, Scope};
use crate::plan::{CompiledPlan, PlanNode, PlanNodeIdGenerator, PlanNodeKind};
use crate::schema::EngineSchema;

mod access;
mod dml;
mod query;

pub(crate) fn object_name_to_raw_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .filter_map(|part| match part {
            ObjectNamePart::Identifier(ident) => Some(ident.value.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn table_object_to_raw_string(table: &TableObject) -> String {
    match table {
        TableObject::TableName(name) => object_name_to_raw_string(name),
        TableObject::TableFunction(func) => object_name_to_raw_string(&func.name),
    }
}

/// The last part of a possibly schema-qualified name, upper-cased.
fn base_name(name: &ObjectName) -> String {
    object_name_to_raw_string(name)
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// One compilation of one statement. Owns the node-id sequence and the
/// parameter slots, so nothing is shared between compiles.
pub struct Planner<'a> {
    schema: &'a EngineSchema,
    catalog: &'a Database,
    options: &'a PlanOptions,
    ids: PlanNodeIdGenerator,
    params: ParameterTypes,
}

impl<'a> Planner<'a> {
    pub fn new(schema: &'a EngineSchema, catalog: &'a Database, options: &'a PlanOptions) -> Self {
        Self {
            schema,
            catalog,
            options,
            ids: PlanNodeIdGenerator::new(),
            params: ParameterTypes::new(),
        }
    }

    /// Plans `statement`. `extracted` holds the literals lifted out of the
    /// text, one per `$n` placeholder; they are coerced to the inferred
    /// parameter types.
    pub fn compile(
        mut self,
        statement: &Statement,
        sql: &str,
        extracted: &[Value],
    ) -> Result<CompiledPlan> {
        let (root, read_only) = self.plan_statement(statement)?;

        let parameters = self.params.finalize(extracted)?;
        let extracted_param_values = extracted
            .iter()
            .zip(&parameters)
            .map(|(value, data_type)| value.coerce_to(data_type))
            .collect::<Result<Vec<_>>>()?;

        let partitioning = analysis::partitioning::analyze(&root, self.catalog, read_only);
        let nondeterminism_detail = analysis::determinism::analyze(&root);

        Ok(CompiledPlan {
            sql: sql.to_string(),
            root,
            parameters,
            extracted_param_values,
            read_only,
            partitioning,
            content_deterministic: nondeterminism_detail.is_none(),
            nondeterminism_detail,
        })
    }

    fn plan_statement(&mut self, stmt: &Statement) -> Result<(PlanNode, bool)> {
        match stmt {
            Statement::Query(query) => Ok((self.plan_query(query)?, true)),
            Statement::Insert(insert) => Ok((self.plan_insert(insert)?, false)),
            Statement::Update(ast::Update {
                table,
                assignments,
                from,
                selection,
                ..
            }) => Ok((
                self.plan_update(table, assignments, from.is_some(), selection.as_ref())?,
                false,
            )),
            Statement::Delete(delete) => Ok((self.plan_delete(delete)?, false)),
            other => Err(Error::unsupported_statement(format!(
                "only SELECT, INSERT, UPDATE and DELETE can be planned ad hoc: {}",
                other
            ))),
        }
    }

    /// Adds the table behind `factor` to `scope` and returns its qualifier.
    fn add_to_scope(&self, scope: &mut Scope, factor: &TableFactor) -> Result<String> {
        let (name, alias) = match factor {
            TableFactor::Table { name, alias, .. } => (
                base_name(name),
                alias.as_ref().map(|a| a.name.value.to_uppercase()),
            ),
            other => {
                return Err(Error::unsupported(format!("table expression {}", other)));
            }
        };

        let table = self
            .schema
            .table(&name)
            .ok_or_else(|| Error::table_not_found(&name))?;
        let qualifier = alias.unwrap_or_else(|| name.clone());
        scope.push(qualifier.clone(), table.clone())?;
        Ok(qualifier)
    }

    fn check_join_limit(&self, table_count: usize) -> Result<()> {
        if table_count > self.options.joined_table_limit {
            return Err(Error::invalid_query(format!(
                "statement joins {} tables, exceeding the ad hoc limit of {}",
                table_count, self.options.joined_table_limit
            )));
        }
        Ok(())
    }

    fn node(&mut self, kind: PlanNodeKind, child: PlanNode) -> PlanNode {
        PlanNode::unary(self.ids.next_id(), kind, child)
    }
}

fn require_single_table(tables: &[ast::TableWithJoins], what: &str) -> Result<TableFactor> {
    match tables {
        [table] if table.joins.is_empty() => Ok(table.relation.clone()),
        _ => Err(Error::unsupported(format!("{} on more than one table", what))),
    }
}
