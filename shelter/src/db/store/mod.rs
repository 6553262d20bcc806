//! Document store abstraction.
//!
//! A [`DocumentStore`] holds schemaless JSON documents grouped by [`Collection`]. It knows
//! nothing about public `ID`s or creation stamps: those are layered on top by the document
//! manager. Two backends are provided:
//!
//! - [`postgres::PostgresStore`]: one `documents` table with a JSONB body, filtered by containment
//! - [`in_memory::InMemoryStore`]: insertion-ordered vectors behind a lock, for development and tests
//!
//! The store handle is created once at startup and shared as `Arc<dyn DocumentStore>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::{collection::Collection, errors::Result},
    types::{DocumentId, Filter, Record},
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Which stored documents an operation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The document with this store-native id
    Native(DocumentId),
    /// Documents whose body holds an equal value for every key
    Fields(Filter),
}

/// Acknowledgement of an insert: the identity the store assigned to the new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub native_id: DocumentId,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Return up to `limit` documents matching `selector`, in store-native order.
    async fn find(&self, collection: Collection, selector: &Selector, limit: i64) -> Result<Vec<Record>>;

    /// Insert a new document, returning its generated id and creation timestamp.
    async fn insert(&self, collection: Collection, record: Record) -> Result<Inserted>;

    /// Merge `values` into the first document matching `selector`. Returns the matched count (0 or 1).
    async fn update_one(&self, collection: Collection, selector: &Selector, values: &Record) -> Result<u64>;

    /// Delete the first document matching `selector`. Returns the deleted count (0 or 1).
    async fn delete_one(&self, collection: Collection, selector: &Selector) -> Result<u64>;

    /// Release connections held by the store.
    async fn close(&self) {}
}
