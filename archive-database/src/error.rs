use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The statement is not a `DELETE FROM <tables> [WHERE <predicate>]`.
    #[error("Malformed delete statement: {sql}")]
    MalformedStatement { sql: String },

    #[error("Table does not exist: {0}")]
    MissingTable(String),
}

impl StoreError {
    pub fn malformed(sql: impl Into<String>) -> Self {
        Self::MalformedStatement { sql: sql.into() }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
