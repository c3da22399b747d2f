use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::DataType;

use crate::plan::PlanExpr;
use crate::schema::SchemaTable;

#[derive(Debug, Clone)]
pub struct ScopeTable {
    /// Alias if the statement gave one, otherwise the table name.
    pub qualifier: String,
    pub table: SchemaTable,
}

/// Tables visible to an expression, in FROM order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    tables: Vec<ScopeTable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, qualifier: String, table: SchemaTable) -> Result<()> {
        if self.tables.iter().any(|t| t.qualifier == qualifier) {
            return Err(Error::invalid_query(format!(
                "table name {} is specified more than once",
                qualifier
            )));
        }
        self.tables.push(ScopeTable { qualifier, table });
        Ok(())
    }

    pub fn tables(&self) -> &[ScopeTable] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn by_qualifier(&self, qualifier: &str) -> Option<&ScopeTable> {
        self.tables
            .iter()
            .find(|t| t.qualifier.eq_ignore_ascii_case(qualifier))
    }

    /// Resolves `COL`, `Q.COL` or `SCHEMA.Q.COL` to a column reference.
    pub fn resolve(&self, parts: &[&str]) -> Result<PlanExpr> {
        match parts {
            [] => Err(Error::invalid_query("empty column reference")),
            [name] => {
                let mut matches = self
                    .tables
                    .iter()
                    .filter_map(|t| t.table.column(name).map(|c| (t, c)));
                let (table, column) = matches
                    .next()
                    .ok_or_else(|| Error::column_not_found(name.to_uppercase()))?;
                if matches.next().is_some() {
                    return Err(Error::ambiguous_column(name.to_uppercase()));
                }
                Ok(column_expr(table, &column.name, column.data_type))
            }
            [.., qualifier, name] => {
                let table = self
                    .by_qualifier(qualifier)
                    .ok_or_else(|| Error::table_not_found(qualifier.to_uppercase()))?;
                let column = table.table.column(name).ok_or_else(|| {
                    Error::column_not_found(format!(
                        "{}.{}",
                        qualifier.to_uppercase(),
                        name.to_uppercase()
                    ))
                })?;
                Ok(column_expr(table, &column.name, column.data_type))
            }
        }
    }

    /// Every column of every table, or of one qualifier, for `*` expansion.
    pub fn wildcard(&self, qualifier: Option<&str>) -> Result<Vec<(String, PlanExpr)>> {
        let tables: Vec<&ScopeTable> = match qualifier {
            Some(q) => vec![
                self.by_qualifier(q)
                    .ok_or_else(|| Error::table_not_found(q.to_uppercase()))?,
            ],
            None => self.tables.iter().collect(),
        };
        Ok(tables
            .into_iter()
            .flat_map(|t| {
                t.table
                    .columns
                    .iter()
                    .map(move |c| (c.name.clone(), column_expr(t, &c.name, c.data_type)))
            })
            .collect())
    }
}

fn column_expr(table: &ScopeTable, name: &str, data_type: DataType) -> PlanExpr {
    PlanExpr::Column {
        qualifier: table.qualifier.clone(),
        table: table.table.name.clone(),
        name: name.to_string(),
        data_type,
    }
}
