use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(String),
    InvalidQuery(String),
    TableNotFound(String),
    ColumnNotFound(String),
    AmbiguousColumn(String),
    TypeMismatch { expected: String, actual: String },
    UnsupportedFeature(String),
    UnsupportedStatement(String),
    InvalidLiteral(String),
    Internal(String),
}

impl Error {
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Error::ParseError(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound(name.into())
    }

    pub fn column_not_found(name: impl Into<String>) -> Self {
        Error::ColumnNotFound(name.into())
    }

    pub fn ambiguous_column(name: impl Into<String>) -> Self {
        Error::AmbiguousColumn(name.into())
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFeature(msg.into())
    }

    pub fn unsupported_statement(msg: impl Into<String>) -> Self {
        Error::UnsupportedStatement(msg.into())
    }

    pub fn invalid_literal(msg: impl Into<String>) -> Self {
        Error::InvalidLiteral(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseError(msg) => write!(f, "Parse error: {}", msg),
            Error::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            Error::TableNotFound(name) => write!(f, "Table not found: {}", name),
            Error::ColumnNotFound(name) => write!(f, "Column not found: {}", name),
            Error::AmbiguousColumn(name) => write!(f, "Ambiguous column: {}", name),
            Error::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            Error::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            Error::UnsupportedStatement(msg) => write!(f, "Unsupported statement: {}", msg),
            Error::InvalidLiteral(msg) => write!(f, "Invalid literal: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
