use std::sync::Arc;

use adhocsql::{Database, PlannerConfig, PlannerError, PlannerTool, Value};

use crate::common::{SilentEngine, catalog, cluster, counting_planner, plan_count, planner};

#[test]
fn test_empty_sql_is_rejected_before_any_work() {
    let (tool, plans) = counting_planner(1);
    tool.plan_sql("SELECT * FROM t WHERE pkey = 1", None, true, true)
        .unwrap();

    for (partition, infer) in [(None, true), (Some(Value::integer(1)), false)] {
        let err = tool
            .plan_sql("", partition.as_ref(), infer, true)
            .unwrap_err();
        assert_eq!(err, PlannerError::EmptySql);
        assert_eq!(err.to_string(), "Can't plan empty or null SQL.");
    }
    assert_eq!(plan_count(&plans), 1);
}

#[test]
fn test_blank_sql_is_a_compile_error() {
    let err = planner().plan_sql("   ", None, true, true).unwrap_err();
    assert!(err.is_compile_error());
}

#[test]
fn test_syntax_error() {
    let err = planner()
        .plan_sql("SELEC * FROM t", None, true, true)
        .unwrap_err();
    assert!(matches!(err, PlannerError::Compile(_)));
    assert!(err.to_string().starts_with("Error compiling query: "));
}

#[test]
fn test_planning_error_carries_message() {
    let err = planner()
        .plan_sql("SELECT missing FROM t", None, true, true)
        .unwrap_err();
    match &err {
        PlannerError::Planning(message) => assert!(message.contains("MISSING")),
        other => panic!("expected planning error, got {:?}", other),
    }
    assert!(err.to_string().starts_with("ERROR: "));
}

#[test]
fn test_planning_failure_without_message() {
    let catalog = catalog();
    let engine = SilentEngine::new(Arc::clone(&catalog));
    let tool = PlannerTool::with_capability(cluster(), catalog, 1, PlannerConfig::default(), engine)
        .unwrap();

    let err = tool
        .plan_sql("SELECT * FROM t WHERE pkey = 1", None, true, true)
        .unwrap_err();
    assert_eq!(err, PlannerError::UnknownPlanning);
    assert_eq!(err.to_string(), "ERROR: UNKNOWN PLANNING ERROR");
}

#[test]
fn test_join_limit() {
    let tool = planner();
    let sql = "SELECT a.v FROM t a, t b, t c, t d, t e, t f \
               WHERE a.pkey = b.pkey AND b.pkey = c.pkey AND c.pkey = d.pkey \
               AND d.pkey = e.pkey AND e.pkey = f.pkey";
    let err = tool.plan_sql(sql, None, true, true).unwrap_err();
    assert!(matches!(err, PlannerError::Planning(_)));

    let five = "SELECT a.v FROM t a, t b, t c, t d, t e \
                WHERE a.pkey = b.pkey AND b.pkey = c.pkey AND c.pkey = d.pkey \
                AND d.pkey = e.pkey AND a.pkey = 1";
    let statement = tool.plan_sql(five, None, true, true).unwrap();
    assert_eq!(statement.partition_param, Some(Value::integer(1)));
}

#[test]
fn test_parameterization_policy() {
    let tool = planner();
    let err = tool
        .plan_sql("SELECT v FROM t WHERE pkey = ?", None, true, false)
        .unwrap_err();
    assert_eq!(err, PlannerError::ParameterizationViolation);
    assert_eq!(err.to_string(), "ERROR: PARAMETERIZATION IN AD HOC QUERY");

    assert!(
        tool.plan_sql("SELECT v FROM t WHERE pkey = 1", None, true, false)
            .is_ok()
    );
    assert!(
        tool.plan_sql("SELECT v FROM t WHERE pkey = ?", None, true, true)
            .is_ok()
    );
}

#[test]
fn test_failures_leave_cache_intact() {
    let (tool, plans) = counting_planner(1);
    let sql = "SELECT v FROM t WHERE pkey = 1";
    let cached = tool.plan_sql(sql, None, true, true).unwrap();

    assert!(tool.plan_sql("SELECT nope FROM t", None, true, true).is_err());
    assert!(tool.plan_sql("DROP TABLE t", None, true, true).is_err());

    assert_eq!(tool.plan_sql(sql, None, true, true).unwrap(), cached);
    let other = tool
        .plan_sql("SELECT v FROM t WHERE pkey = 2", None, true, true)
        .unwrap();
    assert!(Arc::ptr_eq(&cached.core, &other.core));
    assert_eq!(plan_count(&plans), 2);
}

#[test]
fn test_malformed_catalog_fails_construction() {
    let db = Database::builder("broken")
        .ddl("CREATE TABLE A (X INTEGER)")
        .ddl("CREATE TABLE B (Y NOT_A_TYPE)")
        .build()
        .unwrap();

    let err = PlannerTool::new(cluster(), Arc::new(db), 1)
        .err()
        .unwrap();
    match err {
        PlannerError::SchemaBootstrap { statement, message } => {
            assert_eq!(statement, "CREATE TABLE B (Y NOT_A_TYPE)");
            assert!(!message.is_empty());
        }
        other => panic!("expected bootstrap failure, got {:?}", other),
    }
}

#[test]
fn test_invalid_config() {
    let config = PlannerConfig {
        joined_table_limit: 0,
        ..PlannerConfig::default()
    };
    assert!(matches!(
        PlannerTool::with_config(cluster(), catalog(), 1, config).err(),
        Some(PlannerError::Config(_))
    ));
    assert!(adhocsql::planner_from_toml(cluster(), catalog(), 1, "plan_cache_capacity = -1").is_err());
}
