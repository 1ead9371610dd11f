/*!
The configuration context shared by every archiving component
*/

use archive_database::{SchemaMirror, SqliteMirror};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::archive::config::ArchiveOptions;
use crate::archive::entity::EntityRef;
use crate::archive::error::Result;
use crate::archive::guard::DisableGuard;
use crate::archive::registry::Registry;

pub type Clock = fn() -> DateTime<Utc>;

/// Registry, disable guard and clock, built once at startup.
///
/// Registration only happens through [`ContextBuilder`], so a built context
/// never changes its registry.
#[derive(Debug)]
pub struct ArchiveContext {
    registry: Registry,
    guard: DisableGuard,
    clock: Clock,
}

impl ArchiveContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn guard(&self) -> &DisableGuard {
        &self.guard
    }

    /// Timestamp for one archiving operation.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub struct ContextBuilder {
    registry: Registry,
    mirror: Box<dyn SchemaMirror>,
    clock: Clock,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            mirror: Box::new(SqliteMirror),
            clock: Utc::now,
        }
    }

    pub fn with_mirror(mut self, mirror: impl SchemaMirror + 'static) -> Self {
        self.mirror = Box::new(mirror);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// See [`Registry::register`].
    pub fn register(
        &mut self,
        conn: &Connection,
        source: &EntityRef,
        destinations: &[String],
        options: ArchiveOptions,
    ) -> Result<&mut Self> {
        self.registry
            .register(conn, self.mirror.as_ref(), source, destinations, options)?;
        Ok(self)
    }

    pub fn build(self) -> ArchiveContext {
        ArchiveContext {
            registry: self.registry,
            guard: DisableGuard::new(),
            clock: self.clock,
        }
    }
}
