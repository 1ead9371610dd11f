/*!
Store layer for the archive keeper.

Wraps a SQLite connection with the pieces the archiving core needs from its
store: typed delete statements, the native delete entry point, identifier
quoting, timestamp formatting, transaction scoping and archive-table mirroring.
*/

pub mod driver;
pub mod error;
pub mod mirror;
pub mod statement;
pub mod store;

pub use driver::{DeleteExecutor, NativeDelete};
pub use error::{Result, StoreError};
pub use mirror::{SchemaMirror, SqliteMirror};
pub use statement::{DeleteStatement, Predicate};
pub use store::{
    ColumnSpec, describe_table, quote_identifier, table_columns, table_exists, timestamp_literal,
    within_transaction,
};
