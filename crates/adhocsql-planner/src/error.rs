use thiserror::Error;

/// Failures surfaced by [`PlannerTool`](crate::PlannerTool).
///
/// Construction failures (`SchemaBootstrap`, `Config`) leave no usable tool.
/// Everything else is local to one `plan_sql` call and leaves the cache and
/// the embedded engine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("Error loading schema: {message} in DDL statement: {statement}")]
    SchemaBootstrap { statement: String, message: String },

    #[error("Can't plan empty or null SQL.")]
    EmptySql,

    /// The embedded engine raised an error while parsing or planning.
    #[error("Error compiling query: {0}")]
    Compile(String),

    /// Planning produced no plan and reported why.
    #[error("ERROR: {0}")]
    Planning(String),

    /// Planning produced no plan and no reason.
    #[error("ERROR: UNKNOWN PLANNING ERROR")]
    UnknownPlanning,

    #[error("ERROR: PARAMETERIZATION IN AD HOC QUERY")]
    ParameterizationViolation,

    #[error("Statement has a non-deterministic result - {0}")]
    NonDeterministic(String),

    #[error("Invalid planner configuration: {0}")]
    Config(String),

    #[error("Plan for catalog version {actual} cannot be cached for version {expected}")]
    CatalogVersionMismatch { expected: u64, actual: u64 },
}

impl PlannerError {
    /// Whether the statement itself failed to compile, as opposed to a
    /// caller or configuration problem.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            PlannerError::Compile(_) | PlannerError::Planning(_) | PlannerError::UnknownPlanning
        )
    }
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;
