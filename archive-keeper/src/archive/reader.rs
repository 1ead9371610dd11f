/*!
Re-reads archived rows, following archived associations
*/

use archive_database::quote_identifier;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};
use serde_json::{Map, Value as JsonValue};

use crate::archive::context::ArchiveContext;
use crate::archive::destination::Destination;
use crate::archive::entity::{AssociationKind, EntityRef};
use crate::archive::error::{ArchiveError, Result};
use crate::archive::registry::Selector;

/// One archived row, column name to value.
pub type ArchivedRow = Map<String, JsonValue>;

pub struct ArchiveReader<'a> {
    context: &'a ArchiveContext,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(context: &'a ArchiveContext) -> Self {
        Self { context }
    }

    /// Every archived copy of `entity`'s row `key`, oldest first.
    pub fn archived(&self, conn: &Connection, entity: &EntityRef, key: i64) -> Result<Vec<ArchivedRow>> {
        let destination = self.destination(entity)?;
        select_rows(conn, destination.table(), entity.primary_key(), key)
    }

    /// Rows reached from archived row `key` of `entity` through the archived
    /// association `association`.
    pub fn related(
        &self,
        conn: &Connection,
        entity: &EntityRef,
        association: &str,
        key: i64,
    ) -> Result<Vec<ArchivedRow>> {
        let destination = self.destination(entity)?;
        let link = destination.association(association).ok_or_else(|| {
            ArchiveError::Configuration(format!(
                "{} has no archived association {}",
                destination.table(),
                association
            ))
        })?;

        match link.kind {
            AssociationKind::HasMany | AssociationKind::HasOne => {
                select_rows(conn, &link.target_table, &link.foreign_key, key)
            }
            AssociationKind::BelongsTo => {
                let registry = self.context.registry();
                let targets = registry.find(Selector::destinations([link.target_table.as_str()]));
                let target_key = targets
                    .first()
                    .map(|config| config.from.primary_key())
                    .unwrap_or("id");

                let mut rows = Vec::new();
                for owner in select_rows(conn, destination.table(), entity.primary_key(), key)? {
                    if let Some(parent) = owner.get(&link.foreign_key).and_then(JsonValue::as_i64) {
                        rows.extend(select_rows(conn, &link.target_table, target_key, parent)?);
                    }
                }
                Ok(rows)
            }
        }
    }

    fn destination(&self, entity: &EntityRef) -> Result<&'a Destination> {
        self.context
            .registry()
            .find(entity)
            .first()
            .and_then(|config| config.to.first())
            .ok_or_else(|| ArchiveError::NotRegistered(entity.name().to_string()))
    }
}

fn select_rows(conn: &Connection, table: &str, column: &str, key: i64) -> Result<Vec<ArchivedRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} WHERE {} = ?1 ORDER BY rowid",
        quote_identifier(table),
        quote_identifier(column)
    ))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let row_iter = stmt.query_map([key], |row| row_to_json(row, &names))?;

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row?);
    }
    Ok(rows)
}

fn row_to_json(row: &Row, names: &[String]) -> rusqlite::Result<ArchivedRow> {
    let mut map = Map::new();
    for (index, name) in names.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => JsonValue::Null,
            ValueRef::Integer(i) => JsonValue::from(i),
            ValueRef::Real(f) => JsonValue::from(f),
            ValueRef::Text(text) => JsonValue::from(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => JsonValue::from(bytes.to_vec()),
        };
        map.insert(name.clone(), value);
    }
    Ok(map)
}
