use std::fmt;

use adhocsql_common::types::Value;
use sqlparser::ast::Statement;

/// Normalized statement text with literals replaced by numbered placeholders.
///
/// The kinds of the lifted literals are part of the token: `A = 1` and
/// `A = 'x'` render the same placeholder text but must not share a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParsedToken(String);

impl ParsedToken {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub(crate) fn from_statement(statement: &Statement, literals: &[Value]) -> Self {
        let kinds: Vec<&str> = literals.iter().map(Value::kind_name).collect();
        Self(format!("{} /* {} */", statement, kinds.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParsedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
