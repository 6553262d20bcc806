use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
};

use crate::{
    AppState,
    api::models::auth::{LoginForm, TokenResponse},
    errors::{Error, ErrorBody, Result},
};

/// Exchange a username and password for a bearer token
#[utoipa::path(
    post,
    path = "/token",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = ErrorBody),
        (status = 422, description = "Missing form fields", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, form: std::result::Result<Form<LoginForm>, FormRejection>) -> Result<Json<TokenResponse>> {
    let Form(form) = form.map_err(|rejection| Error::validation(rejection.body_text()))?;

    let credential = state.credentials.authenticate(&form.username, &form.password).await?;
    let token = state.tokens.issue(&credential.username)?;
    tracing::info!(username = %credential.username, "Issued access token");

    Ok(Json(TokenResponse::bearer(token)))
}
