use adhocsql_sql::CompiledPlan;
use tracing::warn;

use crate::config::NondeterminismPolicy;
use crate::error::{PlannerError, PlannerResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeterminismClassifier {
    policy: NondeterminismPolicy,
}

impl DeterminismClassifier {
    pub fn new(policy: NondeterminismPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NondeterminismPolicy {
        self.policy
    }

    /// Checks a freshly compiled plan. Returns the diagnostic for a
    /// non-deterministic plan under `Warn`, and an error under `Fail`.
    pub fn classify(&self, sql: &str, plan: &CompiledPlan) -> PlannerResult<Option<String>> {
        if plan.is_content_deterministic() {
            return Ok(None);
        }
        let detail = format!(
            "statement: \"{}\" , reason: {}",
            sql,
            plan.nondeterminism_detail().unwrap_or("unknown")
        );
        match self.policy {
            NondeterminismPolicy::Warn => {
                warn!("Statement has a non-deterministic result - {}", detail);
                Ok(Some(detail))
            }
            NondeterminismPolicy::Fail => Err(PlannerError::NonDeterministic(detail)),
        }
    }
}
