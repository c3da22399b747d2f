//! Ad hoc statement planning for AdhocSQL.
//!
//! [`PlannerTool`] turns SQL text into an [`AdHocPlannedStatement`]: a plan,
//! its parameter values and the partition the statement is routed to.
//! Plans are cached per catalog version in a [`PlanCache`], both by exact
//! text and by parsed token, so statements that differ only in literal
//! values share one [`CorePlan`].

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod determinism;
pub mod error;
pub mod partitioning;
pub mod statement;
pub mod tool;

pub use bootstrap::load_schema;
pub use cache::{PlanCache, PlanCacheStats};
pub use config::{AD_HOC_JOINED_TABLE_LIMIT, NondeterminismPolicy, PlannerConfig};
pub use determinism::DeterminismClassifier;
pub use error::{PlannerError, PlannerResult};
pub use partitioning::{InferenceHints, PartitioningAdvisor, PartitioningDecision};
pub use statement::{AdHocPlannedStatement, CorePlan, Routing};
pub use tool::PlannerTool;
