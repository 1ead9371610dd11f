/*!
Moves rows soft-deleted through a legacy marker column into the archive
*/

use std::sync::Arc;
use std::time::{Duration, Instant};

use archive_database::{Predicate, table_columns, within_transaction};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::archive::context::ArchiveContext;
use crate::archive::entity::EntityRef;
use crate::archive::error::{ArchiveError, Result};
use crate::archive::mover;

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub entity: String,
    /// Rows removed from the live table
    pub moved: usize,
    pub elapsed: Duration,
}

pub struct MigrationRunner {
    context: Arc<ArchiveContext>,
}

impl MigrationRunner {
    pub fn new(context: Arc<ArchiveContext>) -> Self {
        Self { context }
    }

    /// Move every row of `entity` whose marker column is set into its archive.
    ///
    /// All configs of the entity are handled in one transaction: on failure the
    /// live table is left exactly as it was.
    pub fn migrate_from_soft_delete(
        &self,
        conn: &Connection,
        entity: &EntityRef,
    ) -> Result<MigrationReport> {
        let configs = self.context.registry().find(entity);
        if configs.is_empty() {
            return Err(ArchiveError::NotRegistered(entity.name().to_string()));
        }

        let columns = table_columns(conn, entity.table())?;
        if let Some(config) = configs
            .iter()
            .find(|config| !columns.contains(&config.options.magic))
        {
            return Err(ArchiveError::Configuration(format!(
                "{} has no {} column to migrate from",
                entity.table(),
                config.options.magic
            )));
        }

        let started = Instant::now();
        let timestamp = self.context.now();
        let moved = within_transaction(conn, |conn| {
            let mut moved = 0;
            for config in configs {
                let config = config.moving();
                let soft_deleted = Predicate::is_not_null(&config.options.magic);
                moved += mover::move_rows(conn, &config, None, Some(&soft_deleted), &timestamp)?
                    .removed;
            }
            Ok::<_, ArchiveError>(moved)
        })?;

        let report = MigrationReport {
            entity: entity.name().to_string(),
            moved,
            elapsed: started.elapsed(),
        };
        info!(
            "-- {}.migrate_from_soft_delete: {} rows -> {:.4}s",
            report.entity,
            report.moved,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}
