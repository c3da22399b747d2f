//! Replays a catalog's encoded DDL into an embedded SQL engine.

use adhocsql_catalog::Database;
use adhocsql_catalog::encoding::hex_decode_to_string;
use adhocsql_sql::EmbeddedSqlCapability;
use tracing::debug;

use crate::error::{PlannerError, PlannerResult};

/// Decodes the schema blob, then each of its lines, and feeds every
/// non-blank statement to `engine` in order. Returns the statement count.
pub fn load_schema<E>(catalog: &Database, engine: &mut E) -> PlannerResult<usize>
where
    E: EmbeddedSqlCapability + ?Sized,
{
    let decoded =
        hex_decode_to_string(catalog.schema()).map_err(|e| PlannerError::SchemaBootstrap {
            statement: String::new(),
            message: e.to_string(),
        })?;

    let mut loaded = 0;
    for line in decoded.split('\n') {
        let statement =
            hex_decode_to_string(line).map_err(|e| PlannerError::SchemaBootstrap {
                statement: line.to_string(),
                message: e.to_string(),
            })?;
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        engine
            .ingest_ddl(statement)
            .map_err(|e| PlannerError::SchemaBootstrap {
                statement: statement.to_string(),
                message: e.to_string(),
            })?;
        debug!(statement, "loaded DDL");
        loaded += 1;
    }
    Ok(loaded)
}
