use leadflow_core::db::migrations::latest_version;
use leadflow_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "operators");
    assert_table_exists(&conn, "sources");
    assert_table_exists(&conn, "leads");
    assert_table_exists(&conn, "contacts");
    assert_table_exists(&conn, "operator_source_weights");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadflow.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "operators");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_negative_load_and_non_positive_weight() {
    let conn = open_db_in_memory().unwrap();

    let load_err = conn.execute(
        "INSERT INTO operators (uuid, name, current_load) VALUES ('op-1', 'x', -1);",
        [],
    );
    assert!(load_err.is_err());

    conn.execute(
        "INSERT INTO operators (uuid, name) VALUES ('op-1', 'x');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO sources (uuid, name) VALUES ('src-1', 'web');",
        [],
    )
    .unwrap();

    let weight_err = conn.execute(
        "INSERT INTO operator_source_weights (operator_uuid, source_uuid, weight)
         VALUES ('op-1', 'src-1', 0);",
        [],
    );
    assert!(weight_err.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
