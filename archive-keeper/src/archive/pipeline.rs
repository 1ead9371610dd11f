/*!
Per-record delete and destroy, archiving the single row first
*/

use std::sync::Arc;

use archive_database::{DeleteExecutor, DeleteStatement, NativeDelete, Predicate, within_transaction};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::archive::context::ArchiveContext;
use crate::archive::error::{ArchiveError, Result};
use crate::archive::mover;
use crate::archive::record::{DestroyCallbacks, LiveRecord};

pub struct InstancePipeline {
    context: Arc<ArchiveContext>,
}

impl InstancePipeline {
    pub fn new(context: Arc<ArchiveContext>) -> Self {
        Self { context }
    }

    /// Archive and delete the row behind `record`, then freeze it.
    ///
    /// A record that was never saved has no row; it is frozen straight away.
    pub fn delete(&self, conn: &Connection, record: &mut LiveRecord) -> Result<()> {
        if record.is_frozen() {
            return Err(ArchiveError::frozen(record.entity().name()));
        }

        let Some(id) = record.id().filter(|_| !record.is_new_record()) else {
            debug!("Skipping archive of unsaved {}", record.entity().name());
            record.freeze();
            return Ok(());
        };

        let entity = record.entity();
        let statement =
            DeleteStatement::new(entity.table()).filter(Predicate::eq(entity.primary_key(), id));

        within_transaction(conn, |conn| {
            if !self.context.guard().is_disabled() {
                let timestamp = self.context.now();
                for config in self.context.registry().find(entity) {
                    mover::move_rows(conn, config, statement.predicate(), None, &timestamp)?;
                }
            }
            NativeDelete.execute_delete(conn, &statement)?;
            Ok::<_, ArchiveError>(())
        })?;

        record.freeze();
        Ok(())
    }

    /// Run the destroy hooks around [`delete`](Self::delete).
    ///
    /// A vetoing `before_destroy` makes this return `Ok(false)` with nothing
    /// archived or deleted.
    pub fn destroy(
        &self,
        conn: &Connection,
        record: &mut LiveRecord,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<bool> {
        within_transaction(conn, |conn| {
            if !callbacks.before_destroy(record) {
                warn!(
                    "Destroy of {} {:?} vetoed by before_destroy",
                    record.entity().name(),
                    record.id()
                );
                return Ok(false);
            }
            self.delete(conn, record)?;
            callbacks.after_destroy(record);
            Ok(true)
        })
    }

    /// Delete without archiving.
    pub fn force_delete(&self, conn: &Connection, record: &mut LiveRecord) -> Result<()> {
        self.context.guard().disable(|| self.delete(conn, record))
    }

    /// Destroy without archiving.
    pub fn force_destroy(
        &self,
        conn: &Connection,
        record: &mut LiveRecord,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<bool> {
        self.context
            .guard()
            .disable(|| self.destroy(conn, record, callbacks))
    }
}
