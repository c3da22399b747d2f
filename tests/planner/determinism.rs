use adhocsql::{NondeterminismPolicy, PlannerConfig, PlannerError};

use crate::common::{planner, planner_with};

#[test]
fn test_unordered_limit_compiles_with_diagnostic() {
    let statement = planner()
        .plan_sql("SELECT v FROM t LIMIT 2", None, true, true)
        .unwrap();
    assert!(!statement.core.is_content_deterministic());
    assert!(
        statement
            .core
            .nondeterminism_detail
            .as_deref()
            .unwrap()
            .contains("LIMIT")
    );
}

#[test]
fn test_ordered_limit_is_deterministic() {
    let statement = planner()
        .plan_sql("SELECT v FROM t ORDER BY pkey LIMIT 2", None, true, true)
        .unwrap();
    assert!(statement.core.is_content_deterministic());
    assert_eq!(statement.core.nondeterminism_detail, None);
}

#[test]
fn test_random_function_is_flagged() {
    let statement = planner()
        .plan_sql("SELECT v, RAND() FROM t WHERE pkey = 4", None, true, true)
        .unwrap();
    assert!(!statement.core.is_content_deterministic());
    assert!(statement.is_single_partition());
}

#[test]
fn test_fail_policy_rejects_and_does_not_cache() {
    let tool = planner_with(PlannerConfig {
        nondeterminism: NondeterminismPolicy::Fail,
        ..PlannerConfig::default()
    });

    let err = tool
        .plan_sql("SELECT v FROM t WHERE pkey = 1 LIMIT 1", None, true, true)
        .unwrap_err();
    match err {
        PlannerError::NonDeterministic(detail) => {
            assert!(detail.contains("SELECT v FROM t WHERE pkey = 1 LIMIT 1"));
        }
        other => panic!("expected non-determinism failure, got {:?}", other),
    }
    assert_eq!(tool.cache_stats().sql_entries, 0);
    assert_eq!(tool.cache_stats().token_entries, 0);
}
