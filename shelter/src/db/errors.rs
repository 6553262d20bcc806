use thiserror::Error;

use crate::db::collection::Collection;

/// Unified error type for document store operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// A stored document could not be decoded into a record
    #[error("Malformed document in {collection}: {message}")]
    Malformed { collection: Collection, message: String },

    /// A document acknowledged by the store could not be read back
    #[error("Document {id} in {collection} disappeared after write")]
    Vanished { collection: Collection, id: String },

    /// Catch-all for non-recoverable errors (connectivity, protocol, pool exhaustion)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// All sqlx failures are connectivity or protocol problems for this store: none are recoverable
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Other(anyhow::Error::from(err))
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Other(anyhow::Error::from(err))
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
