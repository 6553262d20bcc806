use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    auth::credentials::Credential,
    errors::{Error, Result},
};

/// The account behind a valid bearer token. Rejects disabled accounts.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<Credential>);

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// A missing header, or one using another scheme, means the caller is not authenticated.
pub fn bearer_token(parts: &Parts) -> Result<&str> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(Error::not_authenticated)?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::not_authenticated());
    }
    Ok(token.trim())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        trace!(sub = %claims.sub, "Bearer token verified");

        // A token can outlive the account it was issued for
        let credential = state.credentials.get(&claims.sub).ok_or_else(|| {
            debug!(sub = %claims.sub, "Token subject has no credential");
            Error::invalid_token()
        })?;

        if credential.disabled {
            return Err(Error::InactiveUser);
        }
        Ok(CurrentUser(credential))
    }
}
