//! API request and response data models.
//!
//! Write payloads are accepted as raw JSON and validated against the collection schema
//! in [`crate::db::models`], so unknown fields are dropped and type errors become 422s.
//! Responses are typed so the OpenAPI document describes them.
//!
//! - [`auth`]: login form and token response
//! - [`filters`]: query-string filters shared by the collection routes
//! - [`dogs`], [`users`]: stored record representations

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    errors::{Error, Result},
    types::Record,
};

pub mod auth;
pub mod dogs;
pub mod filters;
pub mod users;

/// Convert a stored record into its typed response.
///
/// A stored record that does not fit the schema is a server-side fault.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| Error::Internal {
        operation: format!("decode stored record: {e}"),
    })
}

pub fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(from_record).collect()
}
