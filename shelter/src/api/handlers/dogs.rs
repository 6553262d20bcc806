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
        models::{dogs::DogResponse, filters::FilterParams, from_record, from_records},
    },
    auth::current_user::CurrentUser,
    db::models::dogs::DogFields,
    errors::{ErrorBody, Result},
};

/// List dogs matching the filters
#[utoipa::path(
    get,
    path = "/dogs/",
    tag = "dogs",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching dogs, at most `length` of them", body = Vec<DogResponse>),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_dogs(State(state): State<AppState>, params: std::result::Result<Query<FilterParams>, QueryRejection>) -> Result<Json<Vec<DogResponse>>> {
    let query = query_filter(params)?;
    let records = state.dogs.get_documents(&query).await?;
    Ok(Json(from_records(records)?))
}

/// Create a dog
#[utoipa::path(
    post,
    path = "/dogs/",
    tag = "dogs",
    request_body = DogFields,
    responses(
        (status = 200, description = "The created dog", body = DogResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid document", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn create_dog(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DogResponse>> {
    let record = state.dogs.add_document(json_payload(payload)?).await?;
    Ok(Json(from_record(record)?))
}

/// Create a dog through the task queue, waiting for the result
#[utoipa::path(
    post,
    path = "/concurrently/dogs/",
    tag = "dogs",
    request_body = DogFields,
    responses(
        (status = 200, description = "The created dog", body = DogResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid document", body = ErrorBody),
        (status = 500, description = "The queued task failed", body = ErrorBody),
        (status = 504, description = "The queued task did not finish in time", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn create_dog_concurrently(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DogResponse>> {
    let record = state
        .dogs
        .add_document_via_queue(state.queue.as_ref(), json_payload(payload)?, state.config.queue.result_timeout)
        .await?;
    Ok(Json(from_record(record)?))
}

/// Update the first dog matching the filters
#[utoipa::path(
    put,
    path = "/dogs/",
    tag = "dogs",
    params(FilterParams),
    request_body = DogFields,
    responses(
        (status = 200, description = "The updated dog", body = DogResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 404, description = "No dog matches the filters", body = ErrorBody),
        (status = 422, description = "Invalid filter or document", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user = %user.username()))]
pub async fn update_dog(
    State(state): State<AppState>,
    user: CurrentUser,
    params: std::result::Result<Query<FilterParams>, QueryRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<DogResponse>> {
    let query = query_filter(params)?;
    let record = state.dogs.update_document(&query, json_payload(payload)?).await?;
    Ok(Json(from_record(record)?))
}

/// Delete the first dog matching the filters
#[utoipa::path(
    delete,
    path = "/dogs/",
    tag = "dogs",
    params(FilterParams),
    responses(
        (status = 200, description = "The deleted dog", body = DogResponse),
        (status = 404, description = "No dog matches the filters", body = ErrorBody),
        (status = 422, description = "Invalid filter", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_dog(State(state): State<AppState>, params: std::result::Result<Query<FilterParams>, QueryRejection>) -> Result<Json<DogResponse>> {
    let query = query_filter(params)?;
    let record = state.dogs.delete_document(&query).await?;
    Ok(Json(from_record(record)?))
}
