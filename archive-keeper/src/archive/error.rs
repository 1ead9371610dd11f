use archive_database::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A deleted or destroyed record was mutated or saved again.
    #[error("Record of {entity} is frozen after deletion")]
    FrozenRecord { entity: String },

    #[error("Entity is not registered for archiving: {0}")]
    NotRegistered(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn frozen(entity: impl Into<String>) -> Self {
        Self::FrozenRecord {
            entity: entity.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
