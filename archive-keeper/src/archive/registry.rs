/*!
Registry mapping live entities to their archive destinations
*/

use std::sync::Arc;

use archive_database::{ColumnSpec, SchemaMirror};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::archive::cascade;
use crate::archive::config::ArchiveOptions;
use crate::archive::destination::Destination;
use crate::archive::entity::EntityRef;
use crate::archive::error::{ArchiveError, Result};

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub from: EntityRef,
    pub to: Vec<Destination>,
    pub options: ArchiveOptions,
}

impl ArchiveConfig {
    /// A copy of this config that moves rows instead of copying them.
    pub fn moving(&self) -> Self {
        let mut config = self.clone();
        config.options.copy = false;
        config
    }
}

/// Which configs a lookup should return.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Configs whose source is one of these entities (identity comparison)
    Entities(Vec<EntityRef>),
    /// Configs whose source table is one of these names. Table names compare
    /// ASCII case-insensitively, as SQLite resolves them.
    Tables(Vec<String>),
    /// Configs with a destination table among these names
    Destinations(Vec<String>),
}

impl Selector {
    pub fn tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tables(tables.into_iter().map(Into::into).collect())
    }

    pub fn destinations<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Destinations(tables.into_iter().map(Into::into).collect())
    }

    fn matches(&self, config: &ArchiveConfig) -> bool {
        match self {
            Self::Entities(entities) => entities
                .iter()
                .any(|entity| Arc::ptr_eq(entity, &config.from)),
            Self::Tables(tables) => tables
                .iter()
                .any(|table| table.eq_ignore_ascii_case(config.from.table())),
            Self::Destinations(tables) => config.to.iter().any(|destination| {
                tables
                    .iter()
                    .any(|table| table.eq_ignore_ascii_case(destination.table()))
            }),
        }
    }
}

impl From<&EntityRef> for Selector {
    fn from(entity: &EntityRef) -> Self {
        Self::Entities(vec![Arc::clone(entity)])
    }
}

impl From<&str> for Selector {
    fn from(table: &str) -> Self {
        Self::Tables(vec![table.to_string()])
    }
}

/// Ordered, append-only collection of archive configs.
#[derive(Debug, Default)]
pub struct Registry {
    configs: Vec<ArchiveConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` for archiving into `destinations`, or into
    /// `archived_<table>` when none are given.
    ///
    /// Returns `false` without touching anything when `source` is already
    /// registered: the first registration wins. Another entity on the same
    /// source table may only archive into tables not already covered.
    pub fn register(
        &mut self,
        conn: &Connection,
        mirror: &dyn SchemaMirror,
        source: &EntityRef,
        destinations: &[String],
        options: ArchiveOptions,
    ) -> Result<bool> {
        if !self.find(source).is_empty() {
            debug!("{} is already registered for archiving", source.name());
            return Ok(false);
        }

        let options = options.normalized();
        let tables = if !destinations.is_empty() {
            destinations.to_vec()
        } else if options.archive {
            return Err(ArchiveError::Configuration(format!(
                "{} archives an archive and needs explicit destinations",
                source.name()
            )));
        } else {
            vec![format!("archived_{}", source.table())]
        };

        let covered = self
            .find(Selector::tables([source.table()]))
            .into_iter()
            .flat_map(|config| config.to.iter())
            .find(|destination| {
                tables
                    .iter()
                    .any(|table| table.eq_ignore_ascii_case(destination.table()))
            });
        if let Some(destination) = covered {
            return Err(ArchiveError::Configuration(format!(
                "{} already archives into {}; {} would copy each row twice",
                source.table(),
                destination.table(),
                source.name()
            )));
        }

        let mut to = Vec::with_capacity(tables.len());
        for table in &tables {
            if options.migrate && !options.archive {
                let added: Vec<ColumnSpec> = options.add.iter().map(ColumnSpec::from).collect();
                mirror.mirror(conn, source.table(), table, &options.excluded_columns(), &added)?;
            }

            let mut destination = Destination::build(conn, source, table, &options)?;
            if !options.archive {
                let linked = cascade::link_archived_associations(self, source, &mut destination);
                debug!("{} archived associations linked on {}", linked, table);
            }
            to.push(destination);
        }

        info!(
            "Registered {} ({}) for archiving into {}",
            source.name(),
            source.table(),
            tables.join(", ")
        );
        self.configs.push(ArchiveConfig {
            from: Arc::clone(source),
            to,
            options,
        });
        Ok(true)
    }

    /// Configs matching `selector`, in registration order.
    pub fn find(&self, selector: impl Into<Selector>) -> Vec<&ArchiveConfig> {
        let selector = selector.into();
        self.configs
            .iter()
            .filter(|config| selector.matches(config))
            .collect()
    }

    /// The registered entity called `name`.
    pub fn entity(&self, name: &str) -> Option<&EntityRef> {
        self.configs
            .iter()
            .map(|config| &config.from)
            .find(|entity| entity.name() == name)
    }

    pub fn configs(&self) -> &[ArchiveConfig] {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
