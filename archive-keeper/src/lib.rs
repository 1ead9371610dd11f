/*!
Archive-on-delete for SQLite.

Deletes of registered entities are redirected: the affected rows are copied
into per-entity archive tables, stamped with a marker timestamp, and only then
removed from the live table, all inside one transaction.
*/

pub mod archive;

pub use archive::config::{ArchiveOptions, ColumnAddition, KeeperConfig};
pub use archive::context::{ArchiveContext, ContextBuilder};
pub use archive::destination::Destination;
pub use archive::entity::{Association, AssociationKind, Dependent, Entity, EntityRef};
pub use archive::error::{ArchiveError, Result};
pub use archive::guard::DisableGuard;
pub use archive::interceptor::ArchivingDelete;
pub use archive::keeper::ArchiveKeeper;
pub use archive::migration::{MigrationReport, MigrationRunner};
pub use archive::pipeline::InstancePipeline;
pub use archive::reader::{ArchiveReader, ArchivedRow};
pub use archive::record::{DestroyCallbacks, LiveRecord, NoCallbacks, RecordState};
pub use archive::registry::{ArchiveConfig, Registry, Selector};

pub use archive_database as database;
