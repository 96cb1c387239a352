//! DuckDB connection wrapper: schema setup and parameterized execution.
//!
//! The journal stores chart records and strategy types as plain tables.
//! Timestamps are kept as fixed-width UTC text (see [`crate::models::format_instant`])
//! so range comparisons and ordering work lexically.

use crate::config::{CHARTS_TABLE, STRATEGY_TYPES_TABLE};
use crate::error::Result;
use duckdb::{types::ValueRef, Connection as DuckDbConnection, ToSql};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

fn schema_ddl() -> String {
    format!(
        r#"
CREATE SEQUENCE IF NOT EXISTS {charts}_seq;

CREATE TABLE IF NOT EXISTS {charts} (
    id           VARCHAR PRIMARY KEY,
    date         VARCHAR NOT NULL,
    -- JSON array of hosted file URLs
    images       VARCHAR NOT NULL,
    strategyType VARCHAR NOT NULL,
    stockName    VARCHAR,
    marketCap    VARCHAR,
    -- NULL on legacy records that never recorded it
    executed     BOOLEAN,
    description  VARCHAR,
    createdAt    VARCHAR NOT NULL,
    -- insertion order; stable across updates, unlike rowid
    seq          BIGINT NOT NULL DEFAULT nextval('{charts}_seq')
);

CREATE TABLE IF NOT EXISTS {strategies} (
    id        VARCHAR PRIMARY KEY,
    name      VARCHAR NOT NULL,
    createdAt VARCHAR NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_charts_date ON {charts} (date);
CREATE INDEX IF NOT EXISTS idx_charts_date_strategy_executed ON {charts} (date, strategyType, executed);
"#,
        charts = CHARTS_TABLE,
        strategies = STRATEGY_TYPES_TABLE,
    )
}

/// Owns the DuckDB connection used by every query interface.
pub struct Connection {
    conn: DuckDbConnection,
    location: String,
}

impl Connection {
    /// Open (or create) a file-backed database and make sure the schema exists.
    ///
    /// The path `":memory:"` opens an in-memory database instead.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = DuckDbConnection::open(path)?;
        let this = Self {
            conn,
            location: path.display().to_string(),
        };
        this.ensure_schema()?;
        info!("Opened chart database at {}", this.location);
        Ok(this)
    }

    /// Open an in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        let this = Self {
            conn,
            location: ":memory:".to_string(),
        };
        this.ensure_schema()?;
        Ok(this)
    }

    /// Create tables and indexes if they are missing. Idempotent.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(&schema_ddl())?;
        debug!("Schema ensured on {}", self.location);
        Ok(())
    }

    /// Where this connection points: a file path or `":memory:"`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Round-trip a trivial query to confirm the database answers.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |r| r.get::<_, i32>(0))?;
        Ok(())
    }

    /// Names of the tables in the main schema, sorted.
    pub fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Run a query and hand each row, as column-name → JSON pairs, to `f`.
    fn for_each_row<F>(&self, sql: &str, params: &[String], mut f: F) -> Result<()>
    where
        F: FnMut(Vec<(String, serde_json::Value)>) -> Result<()>,
    {
        debug!(sql, ?params, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let bound: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let mut rows = stmt.query(bound.as_slice())?;

        // Column names are only known once the statement has run.
        let columns: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                record.push((name.clone(), convert_value_ref(row.get_ref(i)?)));
            }
            f(record)?;
        }
        Ok(())
    }

    /// Rows as column-name → JSON value maps.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut out = Vec::new();
        self.for_each_row(sql, params, |record| {
            out.push(record.into_iter().collect());
            Ok(())
        })?;
        Ok(out)
    }

    /// Rows deserialized into `T` through their JSON object form.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[String]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        self.for_each_row(sql, params, |record| {
            let object: serde_json::Map<String, serde_json::Value> = record.into_iter().collect();
            out.push(serde_json::from_value(serde_json::Value::Object(object))?);
            Ok(())
        })?;
        Ok(out)
    }

    /// First column of the first row, or `None` for an empty result.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<serde_json::Value>> {
        let mut first = None;
        self.for_each_row(sql, params, |record| {
            if first.is_none() {
                first = record.into_iter().next().map(|(_, v)| v);
            }
            Ok(())
        })?;
        Ok(first)
    }

    /// Execute an INSERT/UPDATE/DELETE and return the number of affected rows.
    ///
    /// Takes typed parameters so optional columns can be bound as NULL.
    pub fn execute_update(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        debug!(sql, "update");
        Ok(self.conn.execute(sql, params)?)
    }

}

fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        // Every journal column is text, boolean or an integer aggregate.
        _ => serde_json::Value::Null,
    }
}
