/// Integration tests for the SQLite driver
use dbflat_core::{
    ConnectionConfig, DbflatError, QueryExecutor, SchemaIntrospection, TableRef,
    TransactionalSink, Value,
};
use dbflat_driver_sqlite::{SqliteConnection, SqliteDriver};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Helper to create a test database with sample data
fn setup_test_database() -> (TempDir, SqliteConnection) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("dbflat_test.db");

    let conn = SqliteConnection::open(db_path.to_str().unwrap())
        .expect("Failed to create test database");

    conn.execute_script(
        r#"
        CREATE TABLE config (
            key TEXT NOT NULL PRIMARY KEY,
            value TEXT,
            weight REAL,
            enabled INTEGER DEFAULT 1
        );
        INSERT INTO config (key, value, weight, enabled) VALUES ('alpha', 'one', 1.5, 1);
        INSERT INTO config (key, value, weight, enabled) VALUES ('beta', NULL, 2.25, 0);
        INSERT INTO config (key, value, weight, enabled) VALUES ('gamma', 'three', NULL, 1);
        "#,
    )
    .expect("Failed to setup schema");

    (temp_dir, conn)
}

fn count_rows(conn: &SqliteConnection, table: &str) -> i64 {
    let rows = conn
        .query(&format!("SELECT COUNT(*) FROM \"{}\"", table), &[])
        .expect("count query failed");
    rows[0].get(0).and_then(Value::as_i64).expect("count is integer")
}

#[test]
fn test_query_each_streams_rows_in_order() {
    let (_dir, conn) = setup_test_database();

    let mut seen = Vec::new();
    let summary = conn
        .query_each(
            "SELECT key, value, weight, enabled FROM config ORDER BY key",
            &[],
            &mut |row| {
                assert_eq!(row.values.len(), 4);
                seen.push(row.values.clone());
                Ok(())
            },
        )
        .expect("query failed");

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.column_count(), 4);
    assert_eq!(summary.columns[2].name, "weight");
    assert_eq!(summary.columns[2].data_type, "REAL");
    assert_eq!(
        seen,
        vec![
            vec![
                Value::String("alpha".into()),
                Value::String("one".into()),
                Value::Float64(1.5),
                Value::Int64(1),
            ],
            vec![
                Value::String("beta".into()),
                Value::Null,
                Value::Float64(2.25),
                Value::Int64(0),
            ],
            vec![
                Value::String("gamma".into()),
                Value::String("three".into()),
                Value::Null,
                Value::Int64(1),
            ],
        ]
    );
}

#[test]
fn test_query_each_reports_columns_for_empty_result() {
    let (_dir, conn) = setup_test_database();

    let summary = conn
        .query_each("SELECT * FROM config WHERE 1 = 0", &[], &mut |_| Ok(()))
        .expect("query failed");

    assert_eq!(summary.rows_read, 0);
    assert_eq!(summary.column_count(), 4);
}

#[test]
fn test_query_each_stops_on_callback_error() {
    let (_dir, conn) = setup_test_database();

    let mut calls = 0;
    let result = conn.query_each("SELECT * FROM config", &[], &mut |_| {
        calls += 1;
        Err(DbflatError::Cancelled)
    });

    assert!(matches!(result, Err(DbflatError::Cancelled)));
    assert_eq!(calls, 1);
}

#[test]
fn test_query_with_params() {
    let (_dir, conn) = setup_test_database();

    let rows = conn
        .query(
            "SELECT value FROM config WHERE key = ?",
            &[Value::String("gamma".into())],
        )
        .expect("query failed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_by_name("value"), Some(&Value::String("three".into())));
}

#[test]
fn test_invalid_sql_is_query_error() {
    let (_dir, conn) = setup_test_database();

    let result = conn.query_each("SELEC nonsense", &[], &mut |_| Ok(()));
    assert!(matches!(result, Err(DbflatError::Query(_))));
}

#[test]
fn test_get_columns_in_physical_order() {
    let (_dir, conn) = setup_test_database();

    let columns = conn
        .get_columns(&TableRef::new("config"))
        .expect("introspection failed");

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["key", "value", "weight", "enabled"]);
    assert_eq!(columns[0].ordinal, 0);
    assert!(columns[0].is_primary_key);
    assert!(!columns[0].nullable);
    assert!(columns[1].nullable);

    let qualified = conn
        .column_names(&TableRef::parse("main.config").unwrap())
        .expect("introspection failed");
    assert_eq!(qualified.len(), 4);
}

#[test]
fn test_get_columns_for_missing_table_is_empty() {
    let (_dir, conn) = setup_test_database();

    let columns = conn
        .get_columns(&TableRef::new("no_such_table"))
        .expect("introspection failed");
    assert!(columns.is_empty());
}

#[test]
fn test_transaction_commit() {
    let (_dir, conn) = setup_test_database();

    let mut tx = conn.begin_transaction().expect("begin failed");
    let affected = tx
        .execute_batch(
            "INSERT INTO config (key, value) VALUES (?, ?)",
            &[
                vec![Value::String("delta".into()), Value::String("four".into())],
                vec![Value::String("epsilon".into()), Value::Null],
            ],
        )
        .expect("batch failed");
    assert_eq!(affected, 2);
    tx.commit().expect("commit failed");

    assert_eq!(count_rows(&conn, "config"), 5);
}

#[test]
fn test_transaction_rollback() {
    let (_dir, conn) = setup_test_database();

    let mut tx = conn.begin_transaction().expect("begin failed");
    tx.execute("DELETE FROM config", &[]).expect("delete failed");
    tx.rollback().expect("rollback failed");

    assert_eq!(count_rows(&conn, "config"), 3);
}

#[test]
fn test_transaction_rolls_back_when_dropped() {
    let (_dir, conn) = setup_test_database();

    {
        let mut tx = conn.begin_transaction().expect("begin failed");
        tx.execute_batch(
            "INSERT INTO config (key) VALUES (?)",
            &[vec![Value::String("zeta".into())]],
        )
        .expect("batch failed");
    }

    assert_eq!(count_rows(&conn, "config"), 3);

    // The connection is usable for a fresh transaction afterwards.
    let tx = conn.begin_transaction().expect("begin after drop failed");
    tx.commit().expect("commit failed");
}

#[test]
fn test_failed_batch_leaves_nothing_after_rollback() {
    let (_dir, conn) = setup_test_database();

    let mut tx = conn.begin_transaction().expect("begin failed");
    tx.execute_batch(
        "INSERT INTO config (key) VALUES (?)",
        &[vec![Value::String("eta".into())]],
    )
    .expect("first batch failed");

    // Duplicate primary key
    let result = tx.execute_batch(
        "INSERT INTO config (key) VALUES (?)",
        &[vec![Value::String("alpha".into())]],
    );
    assert!(matches!(result, Err(DbflatError::Query(_))));
    tx.rollback().expect("rollback failed");

    assert_eq!(count_rows(&conn, "config"), 3);
}

#[test]
fn test_driver_connect_and_test_connection() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("driver.db");
    let config = ConnectionConfig::new_sqlite(db_path.to_str().unwrap())
        .with_param("busy_timeout_ms", "250");

    let driver = SqliteDriver::new();
    driver.test_connection(&config).expect("test connection failed");

    let conn = driver.connect(&config).expect("connect failed");
    assert_eq!(conn.driver_name(), "sqlite");
}

#[test]
fn test_driver_requires_path() {
    let driver = SqliteDriver::new();
    let result = driver.connect(&ConnectionConfig::new("sqlite"));
    assert!(matches!(result, Err(DbflatError::Configuration(_))));

    let result = driver.connect(&ConnectionConfig::new_sqlite(":memory:").with_param(
        "busy_timeout_ms",
        "soon",
    ));
    assert!(matches!(result, Err(DbflatError::Configuration(_))));
}

#[test]
fn test_driver_rejects_other_drivers() {
    let driver = SqliteDriver::new();
    let mut config = ConnectionConfig::new_sqlite(":memory:");
    config.driver = "postgres".into();
    assert!(matches!(
        driver.connect(&config),
        Err(DbflatError::Configuration(_))
    ));
}
