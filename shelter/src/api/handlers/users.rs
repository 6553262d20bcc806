use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde_json::Value;

use crate::{
    AppState,
    api::{
        handlers::{json_payload, query_filter},
        models::{filters::FilterParams, from_record, from_records, users::UserResponse},
    },
    auth::current_user::CurrentUser,
    db::models::users::UserFields,
    errors::{ErrorBody, Result},
};

/// List users matching the filters
#[utoipa::path(
    get,
    path = "/users/",
    tag = "users",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching users, at most `length` of them", body = Vec<UserResponse>),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, params: std::result::Result<Query<FilterParams>, QueryRejection>) -> Result<Json<Vec<UserResponse>>> {
    let query = query_filter(params)?;
    let records = state.users.get_documents(&query).await?;
    Ok(Json(from_records(records)?))
}

/// Create a user record
#[utoipa::path(
    post,
    path = "/users/",
    tag = "users",
    request_body = UserFields,
    responses(
        (status = 200, description = "The created user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid document", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let record = state.users.add_document(json_payload(payload)?).await?;
    Ok(Json(from_record(record)?))
}

/// Create a user record through the task queue, waiting for the result
#[utoipa::path(
    post,
    path = "/concurrently/users/",
    tag = "users",
    request_body = UserFields,
    responses(
        (status = 200, description = "The created user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid document", body = ErrorBody),
        (status = 500, description = "The queued task failed", body = ErrorBody),
        (status = 504, description = "The queued task did not finish in time", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn create_user_concurrently(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let record = state
        .users
        .add_document_via_queue(state.queue.as_ref(), json_payload(payload)?, state.config.queue.result_timeout)
        .await?;
    Ok(Json(from_record(record)?))
}

/// Update the first user record matching the filters
#[utoipa::path(
    put,
    path = "/users/",
    tag = "users",
    params(FilterParams),
    request_body = UserFields,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "No user matches the filters", body = ErrorBody),
        (status = 422, description = "Invalid filter or document", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    params: std::result::Result<Query<FilterParams>, QueryRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let query = query_filter(params)?;
    let record = state.users.update_document(&query, json_payload(payload)?).await?;
    Ok(Json(from_record(record)?))
}

/// Delete the first user record matching the filters
#[utoipa::path(
    delete,
    path = "/users/",
    tag = "users",
    params(FilterParams),
    responses(
        (status = 200, description = "The deleted user", body = UserResponse),
        (status = 404, description = "No user matches the filters", body = ErrorBody),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, params: std::result::Result<Query<FilterParams>, QueryRejection>) -> Result<Json<UserResponse>> {
    let query = query_filter(params)?;
    let record = state.users.delete_document(&query).await?;
    Ok(Json(from_record(record)?))
}
