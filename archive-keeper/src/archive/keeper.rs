/*!
Facade that coordinates the archiving components for one configuration context
*/

use std::sync::Arc;

use archive_database::{DeleteExecutor, DeleteStatement, NativeDelete, Predicate, quote_identifier};
use rusqlite::{Connection, params_from_iter};
use tracing::info;

use crate::archive::context::ArchiveContext;
use crate::archive::entity::EntityRef;
use crate::archive::error::Result;
use crate::archive::interceptor::ArchivingDelete;
use crate::archive::migration::{MigrationReport, MigrationRunner};
use crate::archive::pipeline::InstancePipeline;
use crate::archive::reader::ArchiveReader;
use crate::archive::record::{DestroyCallbacks, LiveRecord};

/// Entry point for applications: bulk and per-record deletes, their forced
/// variants, migration and archive reads.
pub struct ArchiveKeeper {
    context: Arc<ArchiveContext>,
    deletes: ArchivingDelete<NativeDelete>,
    pipeline: InstancePipeline,
    migrations: MigrationRunner,
}

impl ArchiveKeeper {
    pub fn new(context: ArchiveContext) -> Self {
        let context = Arc::new(context);
        info!(
            "Archive keeper ready with {} archived entities",
            context.registry().len()
        );
        Self {
            deletes: ArchivingDelete::new(Arc::clone(&context), NativeDelete),
            pipeline: InstancePipeline::new(Arc::clone(&context)),
            migrations: MigrationRunner::new(Arc::clone(&context)),
            context,
        }
    }

    pub fn context(&self) -> &ArchiveContext {
        &self.context
    }

    /// The decorated delete entry point, for callers issuing their own statements.
    pub fn executor(&self) -> &ArchivingDelete<NativeDelete> {
        &self.deletes
    }

    pub fn reader(&self) -> ArchiveReader<'_> {
        ArchiveReader::new(&self.context)
    }

    /// Delete the rows of `entity` matching `predicate`, archiving them first.
    pub fn delete_all(
        &self,
        conn: &Connection,
        entity: &EntityRef,
        predicate: Option<Predicate>,
    ) -> Result<usize> {
        let statement = match predicate {
            Some(predicate) => DeleteStatement::new(entity.table()).filter(predicate),
            None => DeleteStatement::new(entity.table()),
        };
        Ok(self.deletes.execute_delete(conn, &statement)?)
    }

    /// `delete_all` with archiving disabled.
    pub fn force_delete_all(
        &self,
        conn: &Connection,
        entity: &EntityRef,
        predicate: Option<Predicate>,
    ) -> Result<usize> {
        self.context
            .guard()
            .disable(|| self.delete_all(conn, entity, predicate))
    }

    /// Destroy each matching record through its callbacks. Returns how many
    /// were destroyed; vetoed records are skipped.
    pub fn destroy_all(
        &self,
        conn: &Connection,
        entity: &EntityRef,
        predicate: Option<Predicate>,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<usize> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            quote_identifier(entity.primary_key()),
            quote_identifier(entity.table())
        );
        let params = match &predicate {
            Some(predicate) => {
                sql.push_str(&predicate.where_clause());
                predicate.params().to_vec()
            }
            None => Vec::new(),
        };

        let ids = {
            let mut stmt = conn.prepare(&sql)?;
            let id_iter = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, i64>(0))?;
            let mut ids = Vec::new();
            for id in id_iter {
                ids.push(id?);
            }
            ids
        };

        let mut destroyed = 0;
        for id in ids {
            let mut record = LiveRecord::persisted(Arc::clone(entity), id);
            if self.pipeline.destroy(conn, &mut record, callbacks)? {
                destroyed += 1;
            }
        }
        Ok(destroyed)
    }

    /// `destroy_all` with archiving disabled.
    pub fn force_destroy_all(
        &self,
        conn: &Connection,
        entity: &EntityRef,
        predicate: Option<Predicate>,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<usize> {
        self.context
            .guard()
            .disable(|| self.destroy_all(conn, entity, predicate, callbacks))
    }

    pub fn delete(&self, conn: &Connection, record: &mut LiveRecord) -> Result<()> {
        self.pipeline.delete(conn, record)
    }

    pub fn destroy(
        &self,
        conn: &Connection,
        record: &mut LiveRecord,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<bool> {
        self.pipeline.destroy(conn, record, callbacks)
    }

    pub fn force_delete(&self, conn: &Connection, record: &mut LiveRecord) -> Result<()> {
        self.pipeline.force_delete(conn, record)
    }

    pub fn force_destroy(
        &self,
        conn: &Connection,
        record: &mut LiveRecord,
        callbacks: &dyn DestroyCallbacks,
    ) -> Result<bool> {
        self.pipeline.force_destroy(conn, record, callbacks)
    }

    /// See [`MigrationRunner::migrate_from_soft_delete`].
    pub fn migrate_from_soft_delete(
        &self,
        conn: &Connection,
        entity: &EntityRef,
    ) -> Result<MigrationReport> {
        self.migrations.migrate_from_soft_delete(conn, entity)
    }
}
