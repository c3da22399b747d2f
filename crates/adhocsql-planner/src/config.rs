use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// Maximum number of tables one ad hoc statement may join.
pub const AD_HOC_JOINED_TABLE_LIMIT: usize = 5;

pub const DEFAULT_PLAN_CACHE_CAPACITY: usize = 1000;

/// What to do with a statement whose result depends on row order or on a
/// per-call function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NondeterminismPolicy {
    /// Log and plan the statement anyway.
    #[default]
    Warn,
    /// Reject the statement.
    Fail,
}

/// Planner tool configuration
///
/// ```toml
/// plan_cache_capacity = 500
/// joined_table_limit = 4
/// nondeterminism = "fail"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Entries kept per cache tier (default: 1000)
    pub plan_cache_capacity: usize,
    /// Join size guard for full compiles (default: 5)
    pub joined_table_limit: usize,
    /// Handling of non-deterministic statements (default: warn)
    pub nondeterminism: NondeterminismPolicy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            plan_cache_capacity: DEFAULT_PLAN_CACHE_CAPACITY,
            joined_table_limit: AD_HOC_JOINED_TABLE_LIMIT,
            nondeterminism: NondeterminismPolicy::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(text: &str) -> PlannerResult<Self> {
        let config: PlannerConfig =
            toml::from_str(text).map_err(|e| PlannerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        if self.joined_table_limit == 0 {
            return Err(PlannerError::Config(
                "joined_table_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.plan_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.plan_cache_capacity, 1000);
        assert_eq!(config.joined_table_limit, AD_HOC_JOINED_TABLE_LIMIT);
        assert_eq!(config.nondeterminism, NondeterminismPolicy::Warn);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PlannerConfig::from_toml_str("nondeterminism = \"fail\"").unwrap();
        assert_eq!(config.nondeterminism, NondeterminismPolicy::Fail);
        assert_eq!(config.plan_cache_capacity, DEFAULT_PLAN_CACHE_CAPACITY);

        let config =
            PlannerConfig::from_toml_str("plan_cache_capacity = 0\njoined_table_limit = 2").unwrap();
        assert_eq!(config.cache_capacity().get(), 1);
        assert_eq!(config.joined_table_limit, 2);
    }

    #[test]
    fn test_from_toml_rejects_bad_input() {
        assert!(matches!(
            PlannerConfig::from_toml_str("nondeterminism = \"ignore\""),
            Err(PlannerError::Config(_))
        ));
        assert!(matches!(
            PlannerConfig::from_toml_str("joined_table_limit = 0"),
            Err(PlannerError::Config(_))
        ));
        assert!(PlannerConfig::from_toml_str("plan_cache_capacity = \"big\"").is_err());
    }
}
