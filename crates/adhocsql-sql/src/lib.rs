//! Embedded SQL front end for ad hoc planning.
//!
//! [`EmbeddedSqlCapability`] is the contract the planner tool drives;
//! [`EmbeddedSqlEngine`] implements it on top of `sqlparser`.

pub mod analysis;
pub mod capability;
pub mod cost;
pub mod engine;
pub mod expr_planner;
pub mod parameterize;
pub mod plan;
pub mod planner;
pub mod schema;
pub mod token;

pub use capability::{EmbeddedSqlCapability, PlanOptions};
pub use cost::{CostModel, TrivialCostModel};
pub use engine::EmbeddedSqlEngine;
pub use plan::{
    CompiledPlan, PartitionValue, PartitioningAnalysis, PlanExpr, PlanNode, PlanNodeId,
    PlanNodeIdGenerator, PlanNodeKind,
};
pub use schema::EngineSchema;
pub use token::ParsedToken;
