use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// GuardError
///
/// Every failure the access guard can observe. None of these reach the page
/// tree: the edge interceptor and the Guard Orchestrator both degrade them to
/// a redirect (login, or the caller's own scoped root). The catalog handlers
/// are the only place where they are turned into HTTP status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Malformed token, bad signature, or missing claims.
    #[error("credential is malformed or its signature does not verify")]
    InvalidCredential,

    #[error("credential has expired")]
    ExpiredCredential,

    /// The backend could not be reached or answered with an unexpected status.
    #[error("backend request failed: {0}")]
    NetworkFailure(String),

    #[error("role `{0}` has no route table")]
    UnknownRole(String),

    /// The persisted session could not be parsed.
    #[error("persisted session is unreadable: {0}")]
    StorageCorrupt(String),

    #[error("session storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl GuardError {
    /// True for the two token failures, which callers treat as "no session".
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            GuardError::InvalidCredential | GuardError::ExpiredCredential
        )
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = match self {
            GuardError::InvalidCredential | GuardError::ExpiredCredential => {
                StatusCode::UNAUTHORIZED
            }
            GuardError::UnknownRole(_) => StatusCode::FORBIDDEN,
            GuardError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            GuardError::StorageCorrupt(_) | GuardError::StorageUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
