use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::DataType;

use crate::encoding::encode_schema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into().to_uppercase(),
            data_type,
            nullable: true,
        }
    }

    pub fn not_null(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into().to_uppercase(),
            data_type,
            nullable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        Self {
            name: name.into().to_uppercase(),
            columns: columns.iter().map(|c| c.to_uppercase()).collect(),
            unique,
        }
    }
}

/// A table with its partitioning. A table without a partition column is
/// replicated to every partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    partition_column: Option<String>,
    indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_uppercase(),
            columns: Vec::new(),
            partition_column: None,
            indexes: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn partitioned_on(mut self, column: &str) -> Self {
        self.partition_column = Some(column.to_uppercase());
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_primary_key(self, columns: &[&str]) -> Self {
        let name = format!("PK_{}", self.name);
        self.with_index(Index::new(name, columns, true))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn partition_column(&self) -> Option<&Column> {
        self.partition_column
            .as_deref()
            .and_then(|name| self.column(name))
    }

    pub fn is_replicated(&self) -> bool {
        self.partition_column.is_none()
    }

    /// Renders the `CREATE TABLE` statement the embedded engine ingests.
    /// Partitioning and indexes stay catalog metadata.
    pub fn to_ddl(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.nullable {
                    format!("{} {}", c.name, c.data_type)
                } else {
                    format!("{} {} NOT NULL", c.name, c.data_type)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", self.name, columns)
    }
}

/// Read-only catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    name: String,
    tables: IndexMap<String, Table>,
    schema: String,
}

impl Database {
    pub fn builder(name: impl Into<String>) -> DatabaseBuilder {
        DatabaseBuilder {
            name: name.into(),
            tables: IndexMap::new(),
            extra_ddl: Vec::new(),
            encoded_schema: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded DDL blob.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_uppercase())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

pub struct DatabaseBuilder {
    name: String,
    tables: IndexMap<String, Table>,
    extra_ddl: Vec<String>,
    encoded_schema: Option<String>,
}

impl DatabaseBuilder {
    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.name().to_string(), table);
        self
    }

    /// Appends a raw DDL statement after the generated table definitions.
    pub fn ddl(mut self, statement: impl Into<String>) -> Self {
        self.extra_ddl.push(statement.into());
        self
    }

    /// Replaces the generated schema blob with an already encoded one.
    pub fn encoded_schema(mut self, encoded: impl Into<String>) -> Self {
        self.encoded_schema = Some(encoded.into());
        self
    }

    /// Fails when a table is partitioned on a column it does not have.
    pub fn build(self) -> Result<Database> {
        for table in self.tables.values() {
            if let Some(name) = &table.partition_column
                && table.column(name).is_none()
            {
                return Err(Error::column_not_found(format!(
                    "partition column {}.{}",
                    table.name, name
                )));
            }
        }

        let schema = match self.encoded_schema {
            Some(encoded) => encoded,
            None => {
                let statements: Vec<String> = self
                    .tables
                    .values()
                    .map(Table::to_ddl)
                    .chain(self.extra_ddl)
                    .collect();
                encode_schema(&statements)
            }
        };

        Ok(Database {
            name: self.name,
            tables: self.tables,
            schema,
        })
    }
}
