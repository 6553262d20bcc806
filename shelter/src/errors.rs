use crate::db::errors::DbError;
use crate::queue::QueueError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

/// Detail reported when a protected route is called without a bearer token.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";
/// Detail reported for a bad, expired or orphaned bearer token.
pub const INVALID_TOKEN: &str = "Could not validate credentials";
/// Detail reported for a failed login. Never distinguishes unknown user from wrong password.
pub const INVALID_CREDENTIALS: &str = "Incorrect username or password";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but missing or invalid
    #[error("{message}")]
    Unauthenticated { message: String },

    /// Valid token, but the account behind it is disabled
    #[error("Inactive user")]
    InactiveUser,

    /// Malformed or missing input, rejected before any store access
    #[error("{message}")]
    Validation { message: String },

    /// The filter of an update or delete matched no record
    #[error("{message}")]
    NotFound { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Document store failure
    #[error(transparent)]
    Database(#[from] DbError),

    /// Task queue failure on the queued write path
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON error body: `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl Error {
    pub fn not_authenticated() -> Self {
        Error::Unauthenticated {
            message: NOT_AUTHENTICATED.to_string(),
        }
    }

    pub fn invalid_token() -> Self {
        Error::Unauthenticated {
            message: INVALID_TOKEN.to_string(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Error::Unauthenticated {
            message: INVALID_CREDENTIALS.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InactiveUser => StatusCode::BAD_REQUEST,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Queue(QueueError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Error::Internal { .. } | Error::Database(_) | Error::Queue(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } | Error::Validation { message } | Error::NotFound { message } => message.clone(),
            Error::InactiveUser => "Inactive user".to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(_) => "Database error occurred".to_string(),
            Error::Queue(QueueError::TaskFailed { .. }) => "Queued task failed".to_string(),
            Error::Queue(QueueError::Timeout { .. }) => "Timed out waiting for queued task".to_string(),
            Error::Queue(QueueError::Closed | QueueError::Abandoned { .. }) => "Task queue unavailable".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(_) | Error::Queue(_) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Unauthenticated { .. } | Error::InactiveUser => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.user_message(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
