/*!
Copies (or moves) selected source rows into every destination of a config
*/

use archive_database::{
    DeleteExecutor, DeleteStatement, NativeDelete, Predicate, Result, quote_identifier,
    timestamp_literal, within_transaction,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::archive::destination::Destination;
use crate::archive::registry::ArchiveConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Rows written across all destinations
    pub archived: usize,
    /// Rows removed from the source by the move itself
    pub removed: usize,
}

/// Archive the rows of `config.from` matching `original` AND `extra`.
///
/// With `copy` set the source rows stay for the caller's own delete; without it
/// they are deleted here. Either way everything runs in one transaction that
/// joins the caller's, if any.
pub(crate) fn move_rows(
    conn: &Connection,
    config: &ArchiveConfig,
    original: Option<&Predicate>,
    extra: Option<&Predicate>,
    timestamp: &DateTime<Utc>,
) -> Result<MoveOutcome> {
    let predicate = Predicate::combine(original, extra);
    let stamp = timestamp_literal(timestamp);
    let source = config.from.table();

    within_transaction(conn, |conn| {
        let mut outcome = MoveOutcome::default();

        for destination in &config.to {
            let (sql, params) = insert_select(
                source,
                destination,
                predicate.as_ref(),
                &stamp,
                !config.options.copy,
            );
            let rows = conn.execute(&sql, params_from_iter(params.iter()))?;
            debug!("Archived {} rows of {} into {}", rows, source, destination.table());
            outcome.archived += rows;
        }

        if !config.options.copy {
            let statement = match &predicate {
                Some(predicate) => DeleteStatement::new(source).filter(predicate.clone()),
                None => DeleteStatement::new(source),
            };
            outcome.removed = NativeDelete.execute_delete(conn, &statement)?;
        }

        Ok(outcome)
    })
}

/// `INSERT INTO <dest> (...) SELECT ... FROM <source> [WHERE ...]` and its parameters.
///
/// When `keep_legacy_marker` is set and the source has the marker column, its
/// value survives the move and the timestamp only fills gaps.
fn insert_select(
    source: &str,
    destination: &Destination,
    predicate: Option<&Predicate>,
    stamp: &str,
    keep_legacy_marker: bool,
) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let mut selected: Vec<String> = destination
        .copy_columns()
        .iter()
        .map(|column| quote_identifier(column))
        .collect();

    if destination.stamps_updated_at() {
        selected.push("?".to_string());
        params.push(Value::Text(stamp.to_string()));
    }
    if let Some(marker) = destination.marker() {
        if keep_legacy_marker && destination.has_legacy_marker() {
            selected.push(format!("COALESCE({}, ?)", quote_identifier(marker)));
        } else {
            selected.push("?".to_string());
        }
        params.push(Value::Text(stamp.to_string()));
    }

    let columns = destination
        .columns()
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        quote_identifier(destination.table()),
        columns,
        selected.join(", "),
        quote_identifier(source)
    );
    if let Some(predicate) = predicate {
        sql.push_str(&predicate.where_clause());
        params.extend(predicate.params().iter().cloned());
    }

    (sql, params)
}
