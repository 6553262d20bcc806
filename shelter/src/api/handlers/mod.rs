//! HTTP request handlers.
//!
//! # Handler Modules
//!
//! - [`root`]: the HTML greeting and health check
//! - [`auth`]: `POST /token` login
//! - [`dogs`]: `/dogs/` CRUD and `/concurrently/dogs/` queued create
//! - [`users`]: `/users/` CRUD and `/concurrently/users/` queued create
//!
//! # Authentication
//!
//! Create and update routes take a [`CurrentUser`](crate::auth::current_user::CurrentUser)
//! extractor, which runs before the body is read. List and delete routes are open.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], rendered as `{"detail": "..."}` with the
//! matching status. Malformed bodies and query strings are reported as 422.

use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;

use crate::{
    api::models::filters::FilterParams,
    db::query::QueryFilter,
    errors::{Error, Result},
};

pub mod auth;
pub mod dogs;
pub mod root;
pub mod users;

/// Unwrap a JSON body, turning extractor rejections into validation errors.
pub(crate) fn json_payload(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    payload.map(|Json(value)| value).map_err(|rejection| Error::validation(rejection.body_text()))
}

/// Parse the filter query string, turning extractor rejections into validation errors.
pub(crate) fn query_filter(params: std::result::Result<Query<FilterParams>, QueryRejection>) -> Result<QueryFilter> {
    let Query(params) = params.map_err(|rejection| Error::validation(rejection.body_text()))?;
    QueryFilter::try_from(params)
}
