/*!
Delete executor decorator that archives rows before the driver removes them
*/

use std::sync::Arc;

use archive_database::{DeleteExecutor, DeleteStatement, NativeDelete, Result, within_transaction};
use rusqlite::Connection;
use tracing::debug;

use crate::archive::context::ArchiveContext;
use crate::archive::mover;
use crate::archive::registry::Selector;

/// Wraps the driver's delete entry point.
///
/// For every table of a statement that has archive configs, the matching rows
/// are copied to each destination first. The wrapped executor then performs
/// the actual delete, once, in the same transaction as the copies.
pub struct ArchivingDelete<E = NativeDelete> {
    context: Arc<ArchiveContext>,
    inner: E,
}

impl<E: DeleteExecutor> ArchivingDelete<E> {
    pub fn new(context: Arc<ArchiveContext>, inner: E) -> Self {
        Self { context, inner }
    }

    pub fn context(&self) -> &ArchiveContext {
        &self.context
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: DeleteExecutor> DeleteExecutor for ArchivingDelete<E> {
    fn execute_delete(&self, conn: &Connection, statement: &DeleteStatement) -> Result<usize> {
        within_transaction(conn, |conn| {
            if self.context.guard().is_disabled() {
                debug!("Archiving disabled, deleting from {:?}", statement.tables());
            } else {
                let timestamp = self.context.now();
                for table in statement.tables() {
                    for config in self.context.registry().find(Selector::tables([table.as_str()])) {
                        mover::move_rows(conn, config, statement.predicate(), None, &timestamp)?;
                    }
                }
            }

            self.inner.execute_delete(conn, statement)
        })
    }
}
