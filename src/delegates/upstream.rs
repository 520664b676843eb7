//! HTTP client for the upstream services.
//!
//! # Responsibilities
//! - Build upstream URLs from a base URL plus percent-encoded path segments
//! - Forward the caller's `Authorization` header and body unchanged
//! - Capture upstream status, content type and body for relaying
//!
//! # Design Decisions
//! - Every call is attempted exactly once; no retries
//! - Non-2xx answers become `UpstreamError::Status`; the body text is kept
//!   for logs only

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::schema::TimeoutConfig;
use crate::observability::metrics;

/// Longest upstream body excerpt kept in an error.
const MAX_ERROR_BODY: usize = 512;

/// Errors from a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} base URL is unusable: {message}")]
    InvalidBase { service: &'static str, message: String },

    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("{service} answered {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} returned an unreadable body: {message}")]
    Decode { service: &'static str, message: String },
}

impl UpstreamError {
    /// Status the upstream answered with, when it answered at all.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A successful upstream answer, relayed to the client unchanged.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
    service: &'static str,
}

impl Relayed {
    pub fn new(
        service: &'static str,
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Self {
        Self {
            status,
            content_type,
            body,
            service,
        }
    }

    /// True when the upstream sent nothing usable (empty body or JSON `null`).
    pub fn is_empty_payload(&self) -> bool {
        let trimmed = self.body.trim_ascii();
        trimmed.is_empty() || trimmed == b"null"
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UpstreamError> {
        serde_json::from_slice(&self.body).map_err(|e| UpstreamError::Decode {
            service: self.service,
            message: e.to_string(),
        })
    }
}

/// Client bound to one upstream service.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    service: &'static str,
    base: Url,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, UpstreamError> {
        let base = Url::parse(base_url).map_err(|e| UpstreamError::InvalidBase {
            service,
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidBase {
                service,
                message: "cannot be used as a base URL".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()
            .map_err(|e| UpstreamError::Transport {
                service,
                message: e.to_string(),
            })?;

        Ok(Self {
            service,
            base,
            client,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send one request upstream.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        authorization: Option<&HeaderValue>,
        body: Option<Bytes>,
    ) -> Result<Relayed, UpstreamError> {
        let url = self.url(segments);
        tracing::debug!(service = self.service, method = %method, url = %url, "Calling upstream");

        let mut request = self.client.request(method, url);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value.clone());
        }
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream(self.service, "transport_error");
                return Err(UpstreamError::Transport {
                    service: self.service,
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| {
            metrics::record_upstream(self.service, "transport_error");
            UpstreamError::Transport {
                service: self.service,
                message: e.to_string(),
            }
        })?;

        if !status.is_success() {
            metrics::record_upstream(self.service, "error_status");
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(UpstreamError::Status {
                service: self.service,
                status,
                body: text,
            });
        }

        metrics::record_upstream(self.service, "ok");
        Ok(Relayed::new(self.service, status, content_type, body))
    }
}
