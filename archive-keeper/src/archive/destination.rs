/*!
Archive destination descriptors, built once when an entity is registered
*/

use archive_database::table_columns;
use rusqlite::Connection;

use crate::archive::config::ArchiveOptions;
use crate::archive::entity::{Association, Entity};
use crate::archive::error::Result;

const UPDATED_AT: &str = "updated_at";

/// A table receiving copies of deleted rows, and how rows get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    table: String,
    copy_columns: Vec<String>,
    marker: Option<String>,
    legacy_marker: bool,
    stamp_updated_at: bool,
    associations: Vec<Association>,
}

impl Destination {
    /// Describe `table` as an archive of `source` under `options`.
    ///
    /// The copied columns are the source columns minus ignored, subtracted and
    /// added ones, restricted to what `table` actually has. The marker is set
    /// only when `table` carries the marker column.
    pub fn build(
        conn: &Connection,
        source: &Entity,
        table: &str,
        options: &ArchiveOptions,
    ) -> Result<Self> {
        let source_columns = table_columns(conn, source.table())?;
        let archive_columns = table_columns(conn, table)?;
        let excluded = options.excluded_columns();

        let stamp_updated_at = options.timestamps
            && archive_columns.iter().any(|column| column == UPDATED_AT);

        let copy_columns = source_columns
            .iter()
            .filter(|column| !excluded.contains(*column))
            .filter(|column| *column != &options.magic)
            .filter(|column| !(stamp_updated_at && *column == UPDATED_AT))
            .filter(|column| archive_columns.contains(*column))
            .cloned()
            .collect();

        Ok(Self {
            table: table.to_string(),
            copy_columns,
            marker: archive_columns
                .contains(&options.magic)
                .then(|| options.magic.clone()),
            legacy_marker: source_columns.contains(&options.magic),
            stamp_updated_at,
            associations: Vec::new(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns filled from the source row.
    pub fn copy_columns(&self) -> &[String] {
        &self.copy_columns
    }

    /// Column stamped with the archival time, if the table has one.
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// The source carries the marker itself (a legacy soft-delete column).
    pub fn has_legacy_marker(&self) -> bool {
        self.legacy_marker
    }

    pub fn stamps_updated_at(&self) -> bool {
        self.stamp_updated_at
    }

    /// Every column an archived row gets written to.
    pub fn columns(&self) -> Vec<&str> {
        self.copy_columns
            .iter()
            .map(String::as_str)
            .chain(self.stamp_updated_at.then_some(UPDATED_AT))
            .chain(self.marker())
            .collect()
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|association| association.name == name)
    }

    pub(crate) fn link(&mut self, association: Association) {
        self.associations.push(association);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_columns_from_both_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, status TEXT, restored_at DATETIME, updated_at DATETIME, note TEXT);
             CREATE TABLE archived_orders (id INTEGER, status TEXT, updated_at DATETIME, deleted_at DATETIME);",
        )
        .unwrap();
        let order = Entity::new("Order", "orders");

        let plain = Destination::build(
            &conn,
            &order,
            "archived_orders",
            &ArchiveOptions::default().normalized(),
        )
        .unwrap();
        assert_eq!(plain.copy_columns(), ["id", "status", "updated_at"]);
        assert_eq!(plain.marker(), Some("deleted_at"));
        assert!(!plain.has_legacy_marker());

        let stamped = Destination::build(
            &conn,
            &order,
            "archived_orders",
            &ArchiveOptions {
                timestamps: true,
                ..ArchiveOptions::default()
            }
            .normalized(),
        )
        .unwrap();
        assert_eq!(stamped.copy_columns(), ["id", "status"]);
        assert_eq!(stamped.columns(), ["id", "status", "updated_at", "deleted_at"]);
    }
}
