use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::DataType;
use rustc_hash::FxHashMap;
use sqlparser::ast::{self, ColumnOption, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::planner::object_name_to_raw_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTable {
    pub name: String,
    pub columns: Vec<SchemaColumn>,
}

impl SchemaTable {
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// The engine's own view of the schema, built by replaying DDL.
#[derive(Debug, Clone, Default)]
pub struct EngineSchema {
    tables: FxHashMap<String, SchemaTable>,
}

impl EngineSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&SchemaTable> {
        self.tables.get(&name.to_uppercase())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn ingest(&mut self, ddl: &str) -> Result<()> {
        let statements = Parser::parse_sql(&GenericDialect {}, ddl)
            .map_err(|e| Error::parse_error(e.to_string()))?;

        for statement in &statements {
            match statement {
                Statement::CreateTable(create) => self.create_table(create)?,
                Statement::CreateIndex(_) => {}
                other => {
                    return Err(Error::unsupported_statement(format!(
                        "not a schema statement: {}",
                        other
                    )));
                }
            }
        }
        Ok(())
    }

    fn create_table(&mut self, create: &ast::CreateTable) -> Result<()> {
        let name = object_name_to_raw_string(&create.name).to_uppercase();
        if self.tables.contains_key(&name) {
            return Err(Error::invalid_query(format!("table {} already exists", name)));
        }
        if create.columns.is_empty() {
            return Err(Error::invalid_query(format!("table {} has no columns", name)));
        }

        let mut columns: Vec<SchemaColumn> = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let column_name = def.name.value.to_uppercase();
            if columns.iter().any(|c| c.name == column_name) {
                return Err(Error::invalid_query(format!(
                    "duplicate column {} in table {}",
                    column_name, name
                )));
            }
            let type_name = def.data_type.to_string();
            let data_type = DataType::from_sql_name(&type_name).ok_or_else(|| {
                Error::unsupported(format!("column type {} of {}.{}", type_name, name, column_name))
            })?;
            let nullable = !def
                .options
                .iter()
                .any(|o| matches!(o.option, ColumnOption::NotNull));
            columns.push(SchemaColumn {
                name: column_name,
                data_type,
                nullable,
            });
        }

        self.tables.insert(name.clone(), SchemaTable { name, columns });
        Ok(())
    }
}
