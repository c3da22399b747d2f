use std::sync::Arc;

use adhocsql::{Column, DataType, Database, PlannerError, PlannerTool, Routing, Table, Value};

use crate::common::{cluster, planner};

fn decimal_keyed_planner() -> PlannerTool {
    let catalog = Database::builder("ledger")
        .table(
            Table::new("acct")
                .with_column(Column::not_null("d", DataType::Decimal))
                .with_column(Column::nullable("v", DataType::Varchar(Some(16))))
                .partitioned_on("d"),
        )
        .build()
        .unwrap();
    PlannerTool::new(cluster(), Arc::new(catalog), 1).unwrap()
}

#[test]
fn test_decimal_key_routes_by_value_not_spelling() {
    let tool = decimal_keyed_planner();
    let expected = tool
        .cluster()
        .partition_for(&Value::Decimal("1".parse().unwrap()));

    for literal in ["1", "1.0", "1.00", "1.000"] {
        let sql = format!("SELECT v FROM acct WHERE d = {}", literal);
        let statement = tool.plan_sql(&sql, None, true, true).unwrap();
        assert_eq!(
            statement.routing,
            Routing::SinglePartition(expected),
            "{}",
            literal
        );
    }
}

#[test]
fn test_decimal_insert_and_select_agree() {
    let tool = decimal_keyed_planner();
    let insert = tool
        .plan_sql("INSERT INTO acct (d, v) VALUES (2.50, 'x')", None, true, true)
        .unwrap();
    let select = tool
        .plan_sql("SELECT v FROM acct WHERE d = 2.5", None, true, true)
        .unwrap();
    assert!(insert.is_single_partition());
    assert_eq!(insert.routing, select.routing);
}

#[test]
fn test_updating_the_partition_column_is_rejected() {
    let tool = planner();
    let err = tool
        .plan_sql("UPDATE t SET pkey = 5 WHERE pkey = 1", None, true, true)
        .unwrap_err();
    match &err {
        PlannerError::Planning(message) => assert!(message.contains("cannot be updated")),
        other => panic!("expected planning error, got {:?}", other),
    }
    assert_eq!(tool.cache_stats().token_entries, 0);

    let statement = tool
        .plan_sql("UPDATE t SET n = 5 WHERE pkey = 1", None, true, true)
        .unwrap();
    assert_eq!(
        statement.routing,
        Routing::SinglePartition(tool.cluster().partition_for(&Value::integer(1)))
    );
}

#[test]
fn test_unknown_partition_column_fails_catalog_build() {
    let result = Database::builder("broken")
        .table(
            Table::new("t")
                .with_column(Column::not_null("pkey", DataType::BigInt))
                .partitioned_on("missing"),
        )
        .build();
    assert!(result.is_err());
}
