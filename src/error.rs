//! Gateway error taxonomy.
//!
//! Every layer has its own typed error (`VerifyError`, `StoreError`,
//! `UpstreamError`); they all converge here so handlers can return a single
//! type that renders as `{"message": CODE}` (see `http::response`).

use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::verifier::VerifyError;
use crate::delegates::upstream::UpstreamError;
use crate::store::StoreError;

/// Errors surfaced at the handler boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No authenticated user context is attached to the request.
    #[error("user not authenticated")]
    Unauthenticated,

    /// The bearer token failed verification.
    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] VerifyError),

    /// Store lookup missed.
    #[error("record not found")]
    NotFound,

    /// Duplicate key on insert.
    #[error("record already exists")]
    Conflict,

    /// The identity service answered but refused the signup.
    #[error("identity service refused signup")]
    SignupFailed,

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// An upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A dependency presumed healthy returned unusable data.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated | GatewayError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Conflict => StatusCode::CONFLICT,
            GatewayError::Upstream(e) => match e.upstream_status() {
                Some(status) if status.is_client_error() => status,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::SignupFailed
            | GatewayError::StoreUnavailable(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable message code returned to the client. Never carries dependency text.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Unauthenticated => "USER_NOT_AUTHENTICATED",
            GatewayError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            GatewayError::NotFound => "NOT_FOUND",
            GatewayError::Conflict => "CONFLICT",
            GatewayError::SignupFailed => "SIGNUP_FAILED",
            GatewayError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            GatewayError::Upstream(e) => match e.upstream_status() {
                Some(status) if status.is_client_error() => "UPSTREAM_REJECTED",
                _ => "UPSTREAM_ERROR",
            },
            GatewayError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => GatewayError::NotFound,
            StoreError::Conflict => GatewayError::Conflict,
            StoreError::Unavailable(message) => GatewayError::StoreUnavailable(message),
        }
    }
}
