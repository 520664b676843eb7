//! Response rendering.
//!
//! # Responsibilities
//! - Render `GatewayError` as `{"message": CODE}` with its status
//! - Log dependency detail server-side; the client only sees the code
//! - Relay upstream answers with their status, body and content type
//!
//! # Design Decisions
//! - A relayed 204 carries no body
//! - Client-caused failures log at debug, dependency failures at error

use axum::{
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::delegates::upstream::Relayed;
use crate::error::GatewayError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            GatewayError::Unauthenticated
            | GatewayError::InvalidCredential(_)
            | GatewayError::NotFound
            | GatewayError::Conflict => {
                tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            }
            GatewayError::SignupFailed => {
                tracing::warn!("Identity service refused signup");
            }
            _ if status.is_client_error() => {
                tracing::warn!(error = %self, status = status.as_u16(), "Upstream rejected request");
            }
            _ => {
                tracing::error!(error = %self, status = status.as_u16(), "Request failed");
            }
        }

        let body = ErrorBody {
            message: self.public_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return StatusCode::NO_CONTENT.into_response();
        }

        let mut response = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        response
    }
}
