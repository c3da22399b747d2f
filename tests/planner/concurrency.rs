use std::thread;

use adhocsql::{PlannerTool, Value};

use crate::common::{counting_planner, plan_count, planner};

const THREADS: usize = 8;

#[test]
fn test_planner_tool_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PlannerTool>();
}

#[test]
fn test_concurrent_literal_variants() {
    let (tool, plans) = counting_planner(1);

    let statements: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let tool = &tool;
                s.spawn(move || {
                    let sql = format!("SELECT v FROM t WHERE pkey = {}", i);
                    tool.plan_sql(&sql, None, true, true).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, statement) in statements.iter().enumerate() {
        assert_eq!(statement.partition_param, Some(Value::integer(i as i64)));
        assert_eq!(statement.core.root, statements[0].core.root);
    }
    let compiles = plan_count(&plans);
    assert!((1..=THREADS).contains(&compiles));

    let stats = tool.cache_stats();
    assert_eq!(stats.token_entries, 1);
    assert_eq!(stats.sql_entries, THREADS);
}

#[test]
fn test_concurrent_compiles_number_nodes_independently() {
    let tool = planner();

    let roots: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let tool = &tool;
                s.spawn(move || {
                    tool.plan_sql(
                        "SELECT v FROM t WHERE pkey = 3 ORDER BY v",
                        None,
                        false,
                        true,
                    )
                    .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for statement in &roots {
        let mut min = u32::MAX;
        statement.core.root.walk(&mut |n| min = min.min(n.id.0));
        assert_eq!(min, 1);
        assert_eq!(statement.core.root, roots[0].core.root);
    }
}

#[test]
fn test_readers_see_both_tiers_or_neither() {
    let tool = planner();
    let sql = "SELECT v FROM t WHERE pkey = 99";

    thread::scope(|s| {
        s.spawn(|| {
            tool.plan_sql(sql, None, true, true).unwrap();
        });
        s.spawn(|| {
            for _ in 0..200 {
                let stats = tool.cache_stats();
                assert_eq!(stats.sql_entries, stats.token_entries);
            }
        });
    });
    assert_eq!(tool.cache_stats().sql_entries, 1);
}
