use std::num::NonZeroUsize;
use std::sync::Arc;

use adhocsql::{DataType, ParsedToken, PlanCache, PlannerError, Routing, Value};

use crate::common::{counting_planner, plan_count, planner};

#[test]
fn test_repeated_statement_skips_planning() {
    let (tool, plans) = counting_planner(1);
    let sql = "SELECT * FROM t WHERE pkey = 1";

    let first = tool.plan_sql(sql, None, true, true).unwrap();
    let second = tool.plan_sql(sql, None, true, true).unwrap();

    assert_eq!(plan_count(&plans), 1);
    assert_eq!(first, second);
    assert_eq!(tool.cache_stats().sql_hits, 1);
}

#[test]
fn test_literal_variants_share_core_plan() {
    let (tool, plans) = counting_planner(1);

    let one = tool
        .plan_sql("SELECT * FROM t WHERE pkey = 1", None, true, true)
        .unwrap();
    let two = tool
        .plan_sql("SELECT * FROM t WHERE pkey = 2", None, true, true)
        .unwrap();

    assert_eq!(plan_count(&plans), 1);
    assert!(Arc::ptr_eq(&one.core, &two.core));
    assert_eq!(one.partition_param, Some(Value::integer(1)));
    assert_eq!(two.partition_param, Some(Value::integer(2)));
    assert_eq!(two.parameters.values(), &[Value::integer(2)]);
    assert_eq!(
        two.routing,
        Routing::SinglePartition(tool.cluster().partition_for(&Value::integer(2)))
    );

    let stats = tool.cache_stats();
    assert_eq!(stats.token_hits, 1);
    assert_eq!(stats.token_entries, 1);
    assert_eq!(stats.sql_entries, 2);
}

#[test]
fn test_token_hit_populates_literal_cache() {
    let (tool, plans) = counting_planner(1);
    tool.plan_sql("SELECT v FROM t WHERE pkey = 10", None, true, true)
        .unwrap();
    tool.plan_sql("SELECT v FROM t WHERE pkey = 11", None, true, true)
        .unwrap();
    let hits_before = tool.cache_stats().sql_hits;

    tool.plan_sql("SELECT v FROM t WHERE pkey = 11", None, true, true)
        .unwrap();

    assert_eq!(tool.cache_stats().sql_hits, hits_before + 1);
    assert_eq!(plan_count(&plans), 1);
}

#[test]
fn test_literal_cache_uses_untrimmed_text() {
    let (tool, plans) = counting_planner(1);
    let padded = "  SELECT v FROM t WHERE pkey = 7  ";

    let first = tool.plan_sql(padded, None, true, true).unwrap();
    assert_eq!(first.sql, padded);

    tool.plan_sql("SELECT v FROM t WHERE pkey = 7", None, true, true)
        .unwrap();
    assert_eq!(plan_count(&plans), 1);
    assert_eq!(tool.cache_stats().token_hits, 1);

    tool.plan_sql(padded, None, true, true).unwrap();
    assert_eq!(tool.cache_stats().sql_hits, 1);
}

#[test]
fn test_explicit_partition_never_cached() {
    let (tool, plans) = counting_planner(1);
    let key = Value::integer(3);

    for _ in 0..3 {
        let statement = tool
            .plan_sql("SELECT * FROM t WHERE pkey = 1", Some(&key), true, true)
            .unwrap();
        assert_eq!(statement.partition_param, Some(key.clone()));
        assert_eq!(statement.core.partitioning_param_index, None);
    }

    assert_eq!(plan_count(&plans), 3);
    let stats = tool.cache_stats();
    assert_eq!(stats.sql_entries, 0);
    assert_eq!(stats.token_entries, 0);
}

#[test]
fn test_disabled_inference_never_cached() {
    let (tool, plans) = counting_planner(1);

    for _ in 0..3 {
        let statement = tool
            .plan_sql("SELECT * FROM t WHERE pkey = 1", None, false, true)
            .unwrap();
        assert_eq!(statement.partition_param, None);
        assert_eq!(statement.routing, Routing::MultiPartition);
    }

    assert_eq!(plan_count(&plans), 3);
    assert_eq!(tool.cache_stats().sql_entries, 0);
    assert_eq!(tool.cache_stats().token_entries, 0);
}

#[test]
fn test_insert_reuses_plan_with_new_key() {
    let tool = planner();
    let first = tool
        .plan_sql("INSERT INTO t (pkey, v) VALUES (1, 'a')", None, true, true)
        .unwrap();
    assert_eq!(
        first.core.parameter_types,
        vec![DataType::BigInt, DataType::Varchar(Some(16))]
    );
    assert!(!first.core.read_only);

    let second = tool
        .plan_sql("INSERT INTO t (pkey, v) VALUES (2, 'b')", None, true, true)
        .unwrap();
    assert!(Arc::ptr_eq(&first.core, &second.core));
    assert_eq!(second.partition_param, Some(Value::integer(2)));
    assert_eq!(
        second.parameters.values(),
        &[Value::integer(2), Value::string("b")]
    );
}

#[test]
fn test_reused_plan_revalidates_literals() {
    let tool = planner();
    tool.plan_sql("INSERT INTO t (pkey, v) VALUES (1, 'a')", None, true, true)
        .unwrap();

    let err = tool
        .plan_sql(
            "INSERT INTO t (pkey, v) VALUES (2, 'much too long for sixteen')",
            None,
            true,
            true,
        )
        .unwrap_err();
    assert!(matches!(err, PlannerError::Compile(_)));
}

#[test]
fn test_different_literal_kinds_do_not_share() {
    let (tool, plans) = counting_planner(1);
    tool.plan_sql("SELECT v FROM t WHERE n = 1", None, true, true)
        .unwrap();
    let decimal = tool
        .plan_sql("SELECT v FROM t WHERE n = 2.0", None, true, true)
        .unwrap();
    assert_eq!(plan_count(&plans), 2);
    assert_eq!(tool.cache_stats().token_entries, 2);
    assert_eq!(decimal.core.parameter_types, vec![DataType::BigInt]);
}

#[test]
fn test_multi_partition_statements_are_cached() {
    let (tool, plans) = counting_planner(1);
    let first = tool
        .plan_sql("SELECT label FROM codes WHERE code = 4", None, true, true)
        .unwrap();
    assert_eq!(first.routing, Routing::MultiPartition);
    assert_eq!(first.partition_param, None);

    tool.plan_sql("SELECT label FROM codes WHERE code = 5", None, true, true)
        .unwrap();
    assert_eq!(plan_count(&plans), 1);
}

#[test]
fn test_catalog_versions_are_isolated() {
    let (old, old_plans) = counting_planner(5);
    let (new, new_plans) = counting_planner(6);
    let sql = "SELECT * FROM t WHERE pkey = 1";

    let cached = old.plan_sql(sql, None, true, true).unwrap();
    old.plan_sql(sql, None, true, true).unwrap();
    assert_eq!(plan_count(&old_plans), 1);

    let fresh = new.plan_sql(sql, None, true, true).unwrap();
    assert_eq!(plan_count(&new_plans), 1);
    assert_eq!(new.cache_stats().sql_hits, 0);
    assert_eq!(cached.catalog_version, 5);
    assert_eq!(fresh.catalog_version, 6);
    assert_eq!(fresh.core.catalog_version, 6);

    let cache = PlanCache::new(6, NonZeroUsize::new(4).unwrap());
    let err = cache
        .insert(sql, ParsedToken::new("t"), cached)
        .unwrap_err();
    assert_eq!(
        err,
        PlannerError::CatalogVersionMismatch {
            expected: 6,
            actual: 5
        }
    );
    assert!(cache.lookup_by_sql(sql).is_none());
}
