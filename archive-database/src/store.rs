/*!
Connection helpers: quoting, timestamps, transaction scoping and introspection
*/

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

static SAVEPOINT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A column as SQLite reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Quote an identifier for SQLite, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a timestamp the way SQLite's `datetime()` does.
pub fn timestamp_literal(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Run `f` atomically on `conn`.
///
/// Opens a transaction when the connection is idle and a savepoint when a
/// transaction is already running, so the work always joins the caller's
/// transaction. An error from `f` rolls back everything `f` did and is
/// returned unchanged.
pub fn within_transaction<T, E>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<rusqlite::Error>,
{
    if conn.is_autocommit() {
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        return Ok(value);
    }

    let name = format!(
        "archive_sp_{}",
        SAVEPOINT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}")) {
                debug!("Rollback of savepoint {} failed: {}", name, rollback);
            }
            Err(e)
        }
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Columns of `table` in declaration order.
pub fn describe_table(conn: &Connection, table: &str) -> Result<Vec<ColumnSpec>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;

    let column_iter = stmt.query_map([], |row| {
        Ok(ColumnSpec {
            name: row.get(1)?,
            sql_type: row.get(2)?,
        })
    })?;

    let mut columns = Vec::new();
    for column in column_iter {
        columns.push(column?);
    }

    if columns.is_empty() {
        return Err(StoreError::MissingTable(table.to_string()));
    }
    Ok(columns)
}

pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    Ok(describe_table(conn, table)?
        .into_iter()
        .map(|column| column.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("orders"), "\"orders\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn formats_timestamps_like_sqlite() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(timestamp_literal(&ts), "2024-03-09 14:05:07");
    }

    #[test]
    fn describes_tables_and_reports_missing_ones() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)").unwrap();

        assert_eq!(table_columns(&conn, "t").unwrap(), ["id", "name"]);
        assert!(table_exists(&conn, "t").unwrap());
        assert!(!table_exists(&conn, "nope").unwrap());
        assert!(matches!(
            table_columns(&conn, "nope"),
            Err(StoreError::MissingTable(name)) if name == "nope"
        ));
    }

    #[test]
    fn failed_scope_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();

        let result: Result<()> = within_transaction(&conn, |conn| {
            conn.execute("INSERT INTO t VALUES (1)", [])?;
            Err(StoreError::MissingTable("forced".into()))
        });

        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn nested_scope_uses_savepoint_inside_outer_transaction() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();

        let outer: Result<()> = within_transaction(&conn, |conn| {
            conn.execute("INSERT INTO t VALUES (1)", [])?;
            let inner: Result<()> = within_transaction(conn, |conn| {
                conn.execute("INSERT INTO t VALUES (2)", [])?;
                Err(StoreError::MissingTable("forced".into()))
            });
            assert!(inner.is_err());
            Ok(())
        });

        assert!(outer.is_ok());
        assert_eq!(count(&conn), 1);
    }
}
