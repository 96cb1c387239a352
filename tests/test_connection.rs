//! Connection integration tests: schema setup, raw SQL execution, persistence.

use chart_journal::{ChartFilter, ChartJournal, Connection, DisabledFileHost, NewChart};
use std::sync::Arc;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// schema
// ---------------------------------------------------------------------------

#[test]
fn in_memory_connection_has_schema() {
    let conn = Connection::open_in_memory().unwrap();
    assert_eq!(conn.location(), ":memory:");
    assert_eq!(conn.tables().unwrap(), vec!["charts", "strategy_types"]);
    conn.ping().unwrap();
}

#[test]
fn ensure_schema_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    conn.ensure_schema().unwrap();
    conn.ensure_schema().unwrap();
    assert_eq!(conn.tables().unwrap().len(), 2);
}

#[test]
fn memory_path_opens_in_memory() {
    let conn = Connection::open(":memory:").unwrap();
    assert_eq!(conn.location(), ":memory:");
}

// ---------------------------------------------------------------------------
// execute / execute_scalar / execute_update
// ---------------------------------------------------------------------------

fn seeded() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    for (id, name) in [("st-1", "Gap Trading"), ("st-2", "Breakout Trading")] {
        conn.execute_update(
            "INSERT INTO strategy_types (id, name, createdAt) VALUES (?, ?, ?)",
            &[&id, &name, &"2024-01-01T00:00:00.000Z"],
        )
        .unwrap();
    }
    conn
}

#[test]
fn execute_returns_rows_as_json_maps() {
    let conn = seeded();
    let rows = conn
        .execute("SELECT id, name FROM strategy_types ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "st-1");
    assert_eq!(rows[1]["name"], "Breakout Trading");
}

#[test]
fn execute_binds_params() {
    let conn = seeded();
    let rows = conn
        .execute(
            "SELECT * FROM strategy_types WHERE name = ?",
            &["Gap Trading".to_string()],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "st-1");

    let none = conn
        .execute(
            "SELECT * FROM strategy_types WHERE name = ?",
            &["missing".to_string()],
        )
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn execute_scalar_reads_first_column() {
    let conn = seeded();
    let n = conn
        .execute_scalar("SELECT COUNT(*) FROM strategy_types", &[])
        .unwrap();
    assert_eq!(n.and_then(|v| v.as_i64()), Some(2));

    let empty = conn
        .execute_scalar("SELECT id FROM strategy_types WHERE id = 'x'", &[])
        .unwrap();
    assert!(empty.is_none());
}

#[test]
fn execute_update_binds_null_and_counts_rows() {
    let conn = Connection::open_in_memory().unwrap();
    let none: Option<bool> = None;
    let inserted = conn
        .execute_update(
            "INSERT INTO charts (id, date, images, strategyType, executed, createdAt) \
             VALUES (?, ?, ?, ?, ?, ?)",
            &[
                &"c-1",
                &"2024-03-01T00:00:00.000Z",
                &"[]",
                &"st-1",
                &none,
                &"2024-03-01T00:00:00.000Z",
            ],
        )
        .unwrap();
    assert_eq!(inserted, 1);

    let executed = conn
        .execute_scalar("SELECT executed FROM charts WHERE id = 'c-1'", &[])
        .unwrap();
    assert_eq!(executed, Some(serde_json::Value::Null));

    let removed = conn
        .execute_update("DELETE FROM charts WHERE id = ?", &[&"missing"])
        .unwrap();
    assert_eq!(removed, 0);
}

// ---------------------------------------------------------------------------
// persistence
// ---------------------------------------------------------------------------

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("db").join("charts.duckdb");
    let conn = Connection::open(&path).unwrap();
    assert!(path.parent().unwrap().is_dir());
    assert_eq!(conn.location(), path.display().to_string());
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("charts.duckdb");

    let id = {
        let journal = ChartJournal::builder()
            .database_path(&path)
            .file_host(Arc::new(DisabledFileHost))
            .build()
            .unwrap();
        journal.strategy_types().create("Gap Trading").unwrap();
        let id = journal
            .charts()
            .create(&NewChart {
                images: vec!["https://utfs.io/f/a".into()],
                strategy_type: Some("Gap Trading".into()),
                date: Some("2024-03-01".into()),
                ..Default::default()
            })
            .unwrap();
        journal.close();
        id
    };

    let journal = ChartJournal::builder()
        .database_path(&path)
        .file_host(Arc::new(DisabledFileHost))
        .build()
        .unwrap();
    assert!(journal.to_string().contains("charts.duckdb"));
    let charts = journal.charts().list(&ChartFilter::all()).unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].id, id);
    assert_eq!(journal.strategy_types().list().unwrap().len(), 1);
}

#[test]
fn health_lists_tables() {
    let journal = ChartJournal::builder()
        .in_memory()
        .file_host(Arc::new(DisabledFileHost))
        .build()
        .unwrap();
    assert_eq!(journal.health().unwrap(), vec!["charts", "strategy_types"]);
}
