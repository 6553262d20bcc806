//! Document schemas.
//!
//! Each collection declares the fields a stored document may carry. Payloads are
//! deserialized into these structs for validation and serialized back into a
//! [`Record`](crate::types::Record) for storage.
//!
//! - [`dogs`]: shelter dogs
//! - [`users`]: people who adopt them

use serde::{Serialize, de::DeserializeOwned};

pub mod dogs;
pub mod users;

/// Schema of a collection's writable fields.
pub trait DocumentFields: DeserializeOwned + Serialize {
    /// True when no field carries a value
    fn is_empty(&self) -> bool;

    /// Semantic checks that serde cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
