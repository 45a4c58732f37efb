use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::AuthError, repository::RepoError, session::SessionError, storage::StorageError};

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
/// Message returned when the login payload is incomplete.
pub const MISSING_CREDENTIALS: &str = "Email and password are required";

/// AppError
///
/// The error taxonomy of the HTTP boundary. Every handler returns
/// `Result<_, AppError>`, so each failure reaching a client is one of these
/// four shapes. Authorization failures are not represented here: the gate
/// resolves them to redirects (see `gate::GateDecision`).
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),
    /// Bad credentials (401). Deliberately carries no detail so that an unknown
    /// email and a wrong password produce the same response.
    #[error("invalid credentials")]
    Authentication,
    /// The requested content row does not exist (404). The message is already
    /// localized by the caller.
    #[error("{0}")]
    NotFound(String),
    /// The database, auth provider or object store failed (500).
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Authentication => (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Upstream(detail) => {
                // Internal detail stays in the logs; the client gets a generic body.
                tracing::error!(error = %detail, "request failed on an upstream dependency");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Upstream(e.to_string())
    }
}
