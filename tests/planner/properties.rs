use std::sync::Arc;

use proptest::prelude::*;

use crate::common::{counting_planner, plan_count, planner};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cached_plan_matches_fresh_compile(first in any::<i64>(), second in any::<i64>()) {
        let (cached, plans) = counting_planner(1);
        let warm = cached
            .plan_sql(&format!("SELECT v, n FROM t WHERE pkey = {}", first), None, true, true)
            .unwrap();

        let sql = format!("SELECT v, n FROM t WHERE pkey = {}", second);
        let reused = cached.plan_sql(&sql, None, true, true).unwrap();
        let fresh = planner().plan_sql(&sql, None, true, true).unwrap();

        prop_assert_eq!(plan_count(&plans), 1);
        prop_assert!(Arc::ptr_eq(&warm.core, &reused.core));
        prop_assert_eq!(&reused.core.root, &fresh.core.root);
        prop_assert_eq!(&reused.core.parameter_types, &fresh.core.parameter_types);
        prop_assert_eq!(&reused.parameters, &fresh.parameters);
        prop_assert_eq!(&reused.partition_param, &fresh.partition_param);
        prop_assert_eq!(reused.routing, fresh.routing);
    }

    #[test]
    fn cached_insert_routes_by_its_own_key(
        keys in proptest::collection::vec(-1_000_000i64..1_000_000, 1..6),
        label in "[a-z]{0,16}",
    ) {
        let tool = planner();
        for key in &keys {
            let sql = format!("INSERT INTO t (pkey, v) VALUES ({}, '{}')", key, label);
            let statement = tool.plan_sql(&sql, None, true, true).unwrap();
            let expected = adhocsql::Value::integer(*key);
            prop_assert_eq!(
                statement.routing,
                adhocsql::Routing::SinglePartition(tool.cluster().partition_for(&expected))
            );
            prop_assert_eq!(statement.partition_param, Some(expected));
        }
        prop_assert_eq!(tool.cache_stats().token_entries, 1);
    }
}
