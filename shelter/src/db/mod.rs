//! Document persistence and access.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  API handlers    │  (api::handlers)
//! └────────┬─────────┘
//!          │ QueryFilter / JSON payload
//!          ↓
//! ┌──────────────────┐
//! │ DocumentManager  │  (db::handlers - normalize, two-phase create, not-found rules)
//! └────────┬─────────┘
//!          │ Selector / Record
//!          ↓
//! ┌──────────────────┐
//! │  DocumentStore   │  (db::store - PostgreSQL or in-memory)
//! └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`collection`]: per-collection rules (filter fields, creation stamps, payload schemas)
//! - [`query`]: query-field normalization into equality filters
//! - [`models`]: payload schemas for each collection
//! - [`store`]: the store trait and its backends
//! - [`handlers`]: the generic document manager
//! - [`errors`]: store error types

pub mod collection;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod store;

pub use collection::Collection;
pub use handlers::DocumentManager;
pub use query::QueryFilter;
pub use store::{DocumentStore, InMemoryStore, PostgresStore};
