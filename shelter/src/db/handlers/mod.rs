//! Document operations on top of a [`DocumentStore`](crate::db::store::DocumentStore).
//!
//! - [`DocumentManager`]: list, create, update and delete records of one collection
//! - [`insert_document`]: the two-phase create shared with queue workers

pub mod documents;

pub use documents::{DocumentManager, insert_document};
