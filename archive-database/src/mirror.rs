/*!
Keeps archive tables shaped like the live tables they receive rows from
*/

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::store::{ColumnSpec, describe_table, quote_identifier, table_columns, table_exists};

/// Schema collaborator consulted when an archive destination is configured.
pub trait SchemaMirror: Send + Sync {
    /// Make `archive` carry the columns of `source` without `excluded`, plus `added`.
    fn mirror(
        &self,
        conn: &Connection,
        source: &str,
        archive: &str,
        excluded: &[String],
        added: &[ColumnSpec],
    ) -> Result<()>;
}

/// Creates missing archive tables and appends columns the source has gained.
///
/// Archive tables carry no constraints: the same key may be archived more than once.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteMirror;

impl SqliteMirror {
    fn column_definition(column: &ColumnSpec) -> String {
        if column.sql_type.is_empty() {
            quote_identifier(&column.name)
        } else {
            format!("{} {}", quote_identifier(&column.name), column.sql_type)
        }
    }
}

impl SchemaMirror for SqliteMirror {
    fn mirror(
        &self,
        conn: &Connection,
        source: &str,
        archive: &str,
        excluded: &[String],
        added: &[ColumnSpec],
    ) -> Result<()> {
        let wanted: Vec<ColumnSpec> = describe_table(conn, source)?
            .into_iter()
            .filter(|column| !excluded.contains(&column.name))
            .filter(|column| !added.iter().any(|add| add.name == column.name))
            .chain(added.iter().cloned())
            .collect();

        if !table_exists(conn, archive)? {
            let definitions = wanted
                .iter()
                .map(Self::column_definition)
                .collect::<Vec<_>>()
                .join(", ");
            conn.execute_batch(&format!(
                "CREATE TABLE {} ({})",
                quote_identifier(archive),
                definitions
            ))?;
            info!("Created archive table {} for {}", archive, source);
            return Ok(());
        }

        let existing = table_columns(conn, archive)?;
        for column in wanted.iter().filter(|column| !existing.contains(&column.name)) {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_identifier(archive),
                Self::column_definition(column)
            ))?;
            info!("Added column {} to archive table {}", column.name, archive);
        }

        Ok(())
    }
}
