/*!
Configuration management for archiving: per-entity options and the TOML file
*/

use std::path::{Path, PathBuf};

use archive_database::ColumnSpec;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::archive::context::ArchiveContext;
use crate::archive::entity::{Association, Entity, EntityRef};
use crate::archive::error::Result;

pub const DEFAULT_MAGIC: &str = "deleted_at";
pub const RESTORED_MAGIC: &str = "restored_at";

/// A column the archive table carries on top of the source columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnAddition {
    pub name: String,
    pub sql_type: String,
}

impl ColumnAddition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

impl From<&ColumnAddition> for ColumnSpec {
    fn from(addition: &ColumnAddition) -> Self {
        ColumnSpec::new(&addition.name, &addition.sql_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveOptions {
    /// Copy rows and leave removal to the delete; `false` moves them outright.
    pub copy: bool,
    /// Marker column stamped with the archival time
    pub magic: String,
    pub add: Vec<ColumnAddition>,
    /// Left out of the copy's select list
    pub ignore: Option<String>,
    /// Left out of the archive altogether
    pub subtract: Option<String>,
    /// Stamp the archive's `updated_at` instead of copying it
    pub timestamps: bool,
    /// Keep the archive table's schema in step with the source
    pub migrate: bool,
    /// The source is itself an archive; rows leaving it are being restored.
    pub archive: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            copy: true,
            magic: DEFAULT_MAGIC.to_string(),
            add: Vec::new(),
            ignore: None,
            subtract: None,
            timestamps: false,
            migrate: true,
            archive: false,
        }
    }
}

impl ArchiveOptions {
    pub fn archive_of_archive() -> Self {
        Self {
            archive: true,
            ..Self::default()
        }
    }

    /// Fill in the derived options the way registration stores them.
    pub fn normalized(mut self) -> Self {
        self.copy = true;

        if self.archive {
            self.magic = RESTORED_MAGIC.to_string();
            self.add.clear();
            self.ignore = None;
            self.subtract = None;
            return self;
        }

        if self.magic.is_empty() {
            self.magic = DEFAULT_MAGIC.to_string();
        }
        if !self.add.iter().any(|column| column.name == self.magic) {
            self.add.insert(0, ColumnAddition::new(&self.magic, "DATETIME"));
        }
        self.ignore = Some(self.magic.clone());
        self.subtract = Some(RESTORED_MAGIC.to_string());
        self
    }

    /// Columns that never travel from source to archive.
    pub fn excluded_columns(&self) -> Vec<String> {
        self.ignore
            .iter()
            .chain(self.subtract.iter())
            .chain(self.add.iter().map(|column| &column.name))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    pub database: DatabaseConfig,
    /// Registered in file order; list associated children before their parents.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database holding live and archive tables
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityConfig {
    pub name: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Archive tables; empty means `archived_<table>`
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub options: ArchiveOptions,
    #[serde(default)]
    pub associations: Vec<Association>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityConfig {
    pub fn to_entity(&self) -> EntityRef {
        self.associations
            .iter()
            .cloned()
            .fold(
                Entity::new(&self.name, &self.table).with_primary_key(&self.primary_key),
                Entity::with_association,
            )
            .into_ref()
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: PathBuf::from("./archive.db"),
            },
            entities: Vec::new(),
        }
    }
}

impl KeeperConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// `<config dir>/archive-keeper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("archive-keeper").join("config.toml"))
    }

    /// Register every configured entity against `conn`.
    pub fn build_context(&self, conn: &Connection) -> Result<ArchiveContext> {
        let mut builder = ArchiveContext::builder();
        for entity in &self.entities {
            builder.register(
                conn,
                &entity.to_entity(),
                &entity.destinations,
                entity.options.clone(),
            )?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::entity::{AssociationKind, Dependent};

    #[test]
    fn normalizes_forward_options() {
        let options = ArchiveOptions {
            copy: false,
            ..ArchiveOptions::default()
        }
        .normalized();

        assert!(options.copy);
        assert_eq!(options.magic, "deleted_at");
        assert_eq!(options.add, [ColumnAddition::new("deleted_at", "DATETIME")]);
        assert_eq!(options.ignore.as_deref(), Some("deleted_at"));
        assert_eq!(options.subtract.as_deref(), Some("restored_at"));
        assert!(!options.timestamps);
    }

    #[test]
    fn archive_of_archive_uses_restored_marker() {
        let options = ArchiveOptions::archive_of_archive().normalized();
        assert_eq!(options.magic, "restored_at");
        assert!(options.add.is_empty());
        assert!(options.excluded_columns().is_empty());
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = KeeperConfig::from_toml_str(
            r#"
            [database]
            path = "shop.db"

            [[entities]]
            name = "Order"
            table = "orders"

            [entities.options]
            magic = "removed_at"

            [[entities.associations]]
            name = "items"
            kind = "has_many"
            target_table = "line_items"
            foreign_key = "order_id"
            dependent = "destroy"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("shop.db"));
        let order = &config.entities[0];
        assert_eq!(order.primary_key, "id");
        assert!(order.destinations.is_empty());
        assert_eq!(order.options.magic, "removed_at");
        assert!(order.options.migrate);

        let entity = order.to_entity();
        let items = &entity.associations()[0];
        assert_eq!(items.kind, AssociationKind::HasMany);
        assert_eq!(items.dependent, Some(Dependent::Destroy));
    }
}
