use std::sync::Arc;

use adhocsql_catalog::Database;
use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::{DataType, Value};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::capability::{EmbeddedSqlCapability, PlanOptions};
use crate::parameterize::{Extraction, extract_literals};
use crate::plan::CompiledPlan;
use crate::planner::Planner;
use crate::schema::EngineSchema;
use crate::token::ParsedToken;

#[derive(Debug)]
struct ParsedStatement {
    sql: String,
    statement: Statement,
    extraction: Option<Extraction>,
    token: Option<ParsedToken>,
}

/// The built-in [`EmbeddedSqlCapability`]: `sqlparser` for syntax, the
/// catalog for partitioning and indexes, and its own DDL-built schema for
/// name resolution.
#[derive(Debug)]
pub struct EmbeddedSqlEngine {
    catalog: Arc<Database>,
    schema: EngineSchema,
    current: Option<ParsedStatement>,
    last_error: Option<String>,
    parameterized: bool,
}

impl EmbeddedSqlEngine {
    pub fn new(catalog: Arc<Database>) -> Self {
        Self {
            catalog,
            schema: EngineSchema::new(),
            current: None,
            last_error: None,
            parameterized: false,
        }
    }

    pub fn schema(&self) -> &EngineSchema {
        &self.schema
    }

    pub fn catalog(&self) -> &Database {
        &self.catalog
    }

    fn parse_one(sql: &str) -> Result<Statement> {
        let mut statements = Parser::parse_sql(&GenericDialect {}, sql)
            .map_err(|e| Error::parse_error(e.to_string()))?;
        if statements.len() != 1 {
            return Err(Error::parse_error(format!(
                "expected exactly one statement, found {}",
                statements.len()
            )));
        }
        let statement = statements.remove(0);
        match statement {
            Statement::Query(_)
            | Statement::Insert(_)
            | Statement::Update(_)
            | Statement::Delete(_) => Ok(statement),
            other => Err(Error::unsupported_statement(format!(
                "only SELECT, INSERT, UPDATE and DELETE can be planned ad hoc: {}",
                other
            ))),
        }
    }
}

impl EmbeddedSqlCapability for EmbeddedSqlEngine {
    fn ingest_ddl(&mut self, statement: &str) -> Result<()> {
        self.schema.ingest(statement)
    }

    fn parse(&mut self, sql: &str) -> Result<Option<ParsedToken>> {
        self.current = None;
        self.last_error = None;
        self.parameterized = false;

        let statement = Self::parse_one(sql)?;
        let extraction = extract_literals(&statement)?;
        let token = extraction
            .as_ref()
            .map(|e| ParsedToken::from_statement(&e.statement, &e.values));

        self.current = Some(ParsedStatement {
            sql: sql.to_string(),
            statement,
            extraction,
            token: token.clone(),
        });
        Ok(token)
    }

    fn extracted_parameters(&self) -> Vec<Value> {
        self.current
            .as_ref()
            .and_then(|c| c.extraction.as_ref())
            .map(|e| e.values.clone())
            .unwrap_or_default()
    }

    fn set_real_param_types(&mut self, types: &[DataType]) -> Result<()> {
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| Error::internal("no statement has been parsed"))?;
        let Some(extraction) = current.extraction.as_mut() else {
            return if types.is_empty() {
                Ok(())
            } else {
                Err(Error::invalid_query(
                    "statement carries no extracted parameters",
                ))
            };
        };

        if extraction.values.len() != types.len() {
            return Err(Error::invalid_query(format!(
                "statement has {} parameters but the plan expects {}",
                extraction.values.len(),
                types.len()
            )));
        }
        let coerced = extraction
            .values
            .iter()
            .zip(types)
            .map(|(value, data_type)| value.coerce_to(data_type))
            .collect::<Result<Vec<_>>>()?;
        extraction.values = coerced;
        Ok(())
    }

    fn plan(&mut self, sql: &str, options: &PlanOptions) -> Result<Option<CompiledPlan>> {
        if self.current.as_ref().map(|c| c.sql.as_str()) != Some(sql) {
            self.parse(sql)?;
        }
        self.last_error = None;
        self.parameterized = false;

        let current = self
            .current
            .as_ref()
            .ok_or_else(|| Error::internal("no statement has been parsed"))?;
        let (statement, extracted) = match &current.extraction {
            Some(extraction) => (&extraction.statement, extraction.values.as_slice()),
            None => (&current.statement, &[][..]),
        };

        match Planner::new(&self.schema, &self.catalog, options).compile(statement, sql, extracted) {
            Ok(plan) => {
                debug!(
                    nodes = plan.root.node_count(),
                    parameters = plan.parameters.len(),
                    "compiled statement"
                );
                self.parameterized = current.token.is_some();
                Ok(Some(plan))
            }
            Err(Error::Internal(msg)) => Err(Error::Internal(msg)),
            Err(e) => {
                debug!(error = %e, "planning failed");
                self.last_error = Some(e.to_string());
                Ok(None)
            }
        }
    }

    fn last_error_message(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn compiled_as_parameterized_plan(&self) -> bool {
        self.parameterized
    }
}

#[cfg(test)]
mod tests {
    use adhocsql_catalog::{Column, Table};

    use super::*;
    use crate::plan::{PartitionValue, PlanNodeKind};

    fn engine() -> EmbeddedSqlEngine {
        let db = Database::builder("test")
            .table(
                Table::new("accounts")
                    .with_column(Column::not_null("id", DataType::BigInt))
                    .with_column(Column::not_null("region", DataType::Integer))
                    .with_column(Column::nullable("name", DataType::Varchar(Some(32))))
                    .partitioned_on("id")
                    .with_primary_key(&["id"]),
            )
            .table(
                Table::new("regions")
                    .with_column(Column::not_null("region", DataType::Integer))
                    .with_column(Column::nullable("label", DataType::Varchar(None))),
            )
            .build()
            .unwrap();
        let mut engine = EmbeddedSqlEngine::new(Arc::new(db.clone()));
        for table in db.tables() {
            engine.ingest_ddl(&table.to_ddl()).unwrap();
        }
        engine
    }

    fn options() -> PlanOptions {
        PlanOptions::trivial(5)
    }

    #[test]
    fn test_parse_returns_token_and_literals() {
        let mut engine = engine();
        let a = engine.parse("SELECT name FROM accounts WHERE id = 1").unwrap();
        assert_eq!(engine.extracted_parameters(), vec![Value::integer(1)]);
        let b = engine.parse("SELECT name FROM accounts WHERE id = 2").unwrap();
        assert!(a.is_some());
        assert_eq!(a, b);

        let c = engine.parse("SELECT name FROM accounts WHERE id = 'x'").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_errors() {
        let mut engine = engine();
        assert!(matches!(engine.parse("SELEC 1"), Err(Error::ParseError(_))));
        assert!(matches!(
            engine.parse("CREATE TABLE x (a INTEGER)"),
            Err(Error::UnsupportedStatement(_))
        ));
        assert!(engine.parse("SELECT 1 FROM accounts; SELECT 2 FROM accounts").is_err());
    }

    #[test]
    fn test_plan_point_lookup_uses_primary_key() {
        let mut engine = engine();
        let sql = "SELECT name FROM accounts WHERE id = 42";
        engine.parse(sql).unwrap();
        let plan = engine.plan(sql, &options()).unwrap().unwrap();

        assert!(engine.compiled_as_parameterized_plan());
        assert_eq!(plan.parameters, vec![DataType::BigInt]);
        assert_eq!(plan.extracted_param_values, vec![Value::integer(42)]);
        assert_eq!(
            plan.partitioning.partition_value,
            Some(PartitionValue::Parameter(0))
        );
        assert!(plan.root.find(|k| matches!(k, PlanNodeKind::IndexScan { .. })).is_some());
        assert!(plan.is_content_deterministic());
    }

    #[test]
    fn test_plan_failure_sets_message() {
        let mut engine = engine();
        let result = engine.plan("SELECT nope FROM accounts", &options()).unwrap();
        assert!(result.is_none());
        assert!(engine.last_error_message().unwrap().contains("NOPE"));
        assert!(!engine.compiled_as_parameterized_plan());
    }

    #[test]
    fn test_join_limit() {
        let mut engine = engine();
        let sql = "SELECT a.id FROM accounts a JOIN regions r ON a.region = r.region";
        assert!(engine.plan(sql, &PlanOptions::trivial(1)).unwrap().is_none());
        assert!(engine.last_error_message().unwrap().contains("limit"));
        assert!(engine.plan(sql, &options()).unwrap().is_some());
    }

    #[test]
    fn test_user_placeholders_plan_unparameterized() {
        let mut engine = engine();
        let sql = "SELECT name FROM accounts WHERE id = ?";
        assert_eq!(engine.parse(sql).unwrap(), None);
        let plan = engine.plan(sql, &options()).unwrap().unwrap();
        assert!(!engine.compiled_as_parameterized_plan());
        assert!(plan.extracted_param_values.is_empty());
        assert_eq!(plan.parameters, vec![DataType::BigInt]);
    }

    #[test]
    fn test_set_real_param_types_coerces() {
        let mut engine = engine();
        engine.parse("SELECT name FROM accounts WHERE region = 7").unwrap();
        engine.set_real_param_types(&[DataType::Float]).unwrap();
        assert_eq!(engine.extracted_parameters(), vec![Value::float(7.0)]);
        assert!(engine.set_real_param_types(&[]).is_err());
    }

    #[test]
    fn test_unordered_limit_is_flagged() {
        let mut engine = engine();
        let plan = engine
            .plan("SELECT name FROM accounts LIMIT 3", &options())
            .unwrap()
            .unwrap();
        assert!(!plan.is_content_deterministic());
        assert!(plan.nondeterminism_detail().is_some());

        let plan = engine
            .plan("SELECT name FROM accounts ORDER BY id LIMIT 3", &options())
            .unwrap()
            .unwrap();
        assert!(plan.is_content_deterministic());
    }

    #[test]
    fn test_insert_partition_value() {
        let mut engine = engine();
        let plan = engine
            .plan("INSERT INTO accounts (id, region, name) VALUES (9, 1, 'n')", &options())
            .unwrap()
            .unwrap();
        assert!(!plan.read_only);
        assert_eq!(
            plan.partitioning.partition_value,
            Some(PartitionValue::Parameter(0))
        );
        assert_eq!(
            plan.parameters,
            vec![DataType::BigInt, DataType::Integer, DataType::Varchar(Some(32))]
        );
    }

    #[test]
    fn test_replicated_write_is_multi_partition() {
        let mut engine = engine();
        let plan = engine
            .plan("UPDATE regions SET label = 'x' WHERE region = 1", &options())
            .unwrap()
            .unwrap();
        assert_eq!(plan.partitioning.partition_value, None);
        assert_eq!(plan.partitioning.replicated_tables, vec!["REGIONS".to_string()]);
    }

    #[test]
    fn test_node_ids_restart_for_each_compile() {
        let mut engine = engine();
        let sql = "SELECT name FROM accounts WHERE id = 1 ORDER BY name";
        let first = engine.plan(sql, &options()).unwrap().unwrap();
        let second = engine.plan(sql, &options()).unwrap().unwrap();
        assert_eq!(first.root, second.root);
        let mut min = u32::MAX;
        first.root.walk(&mut |n| min = min.min(n.id.0));
        assert_eq!(min, 1);
    }
}
