/*!
Live records and the hooks that run around their destruction
*/

use std::collections::BTreeMap;
use std::iter;

use archive_database::quote_identifier;
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::archive::entity::EntityRef;
use crate::archive::error::{ArchiveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    New,
    Persisted,
    /// Terminal: the row is gone and the record may not change or be saved.
    Destroyed,
}

/// One row of a live table.
#[derive(Debug, Clone)]
pub struct LiveRecord {
    entity: EntityRef,
    id: Option<i64>,
    attributes: BTreeMap<String, Value>,
    state: RecordState,
}

impl LiveRecord {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            id: None,
            attributes: BTreeMap::new(),
            state: RecordState::New,
        }
    }

    /// Handle to a row that already exists under primary key `id`.
    pub fn persisted(entity: EntityRef, id: i64) -> Self {
        Self {
            entity,
            id: Some(id),
            attributes: BTreeMap::new(),
            state: RecordState::Persisted,
        }
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_new_record(&self) -> bool {
        self.state == RecordState::New
    }

    pub fn is_frozen(&self) -> bool {
        self.state == RecordState::Destroyed
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.attributes.insert(column.into(), value.into());
        Ok(self)
    }

    /// Insert a new record or write changed attributes of a persisted one.
    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        self.ensure_mutable()?;
        let table = quote_identifier(self.entity.table());

        let Some(id) = self.id else {
            let sql = if self.attributes.is_empty() {
                format!("INSERT INTO {table} DEFAULT VALUES")
            } else {
                let columns = self
                    .attributes
                    .keys()
                    .map(|column| quote_identifier(column))
                    .collect::<Vec<_>>()
                    .join(", ");
                let placeholders = vec!["?"; self.attributes.len()].join(", ");
                format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})")
            };
            conn.execute(&sql, params_from_iter(self.attributes.values()))?;
            self.id = Some(conn.last_insert_rowid());
            self.state = RecordState::Persisted;
            return Ok(());
        };

        if self.attributes.is_empty() {
            return Ok(());
        }
        let assignments = self
            .attributes
            .keys()
            .map(|column| format!("{} = ?", quote_identifier(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {table} SET {assignments} WHERE {} = ?",
            quote_identifier(self.entity.primary_key())
        );
        let params = self
            .attributes
            .values()
            .cloned()
            .chain(iter::once(Value::Integer(id)));
        conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    pub(crate) fn freeze(&mut self) {
        self.state = RecordState::Destroyed;
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(ArchiveError::frozen(self.entity.name()));
        }
        Ok(())
    }
}

/// Hooks run around a destroy. Returning `false` from `before_destroy` vetoes it.
pub trait DestroyCallbacks {
    fn before_destroy(&self, _record: &LiveRecord) -> bool {
        true
    }

    fn after_destroy(&self, _record: &LiveRecord) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCallbacks;

impl DestroyCallbacks for NoCallbacks {}
