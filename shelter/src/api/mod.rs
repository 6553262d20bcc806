//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response bodies, the login form and query-string filters
//!
//! # API Structure
//!
//! - **Root** (`/`, `/healthz`): HTML greeting and liveness check
//! - **Authentication** (`/token`): form login returning a bearer token
//! - **Dogs** (`/dogs/`, `/concurrently/dogs/`): dog records
//! - **Users** (`/users/`, `/concurrently/users/`): user records
//!
//! Every collection route is also reachable without the trailing slash.
//!
//! # OpenAPI Documentation
//!
//! Endpoints are annotated with `utoipa`. The OpenAPI document is served at `/openapi.json` and rendered
//! at `/docs`.

pub mod handlers;
pub mod models;
