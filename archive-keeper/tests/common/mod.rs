//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use archive_keeper::{ArchiveContext, ArchiveKeeper, ArchiveOptions, Entity, EntityRef};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

pub const STAMP: &str = "2024-06-01 09:30:00";

pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

pub fn count_where(conn: &Connection, table: &str, condition: &str) -> i64 {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {condition}"),
        [],
        |row| row.get(0),
    )
    .unwrap()
}

/// `orders` with 2 open, 3 cancelled and 1 shipped row.
pub fn orders_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, status TEXT NOT NULL, total REAL);
         INSERT INTO orders (status, total) VALUES
            ('open', 10.0), ('cancelled', 12.5), ('open', 3.0),
            ('cancelled', 7.25), ('cancelled', 1.0), ('shipped', 99.0);",
    )
    .unwrap();
    conn
}

/// A keeper with `Order` registered under default options.
pub fn order_keeper(conn: &Connection) -> (ArchiveKeeper, EntityRef) {
    let order = Entity::new("Order", "orders").into_ref();
    let mut builder = ArchiveContext::builder().with_clock(fixed_clock);
    builder
        .register(conn, &order, &[], ArchiveOptions::default())
        .unwrap();
    (ArchiveKeeper::new(builder.build()), order)
}
