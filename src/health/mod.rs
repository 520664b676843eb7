//! Readiness check.
//!
//! Only the store is checked. Upstream failures surface per request as
//! `UPSTREAM_ERROR` instead.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub store: String,
}

impl HealthReport {
    fn up() -> Self {
        Self {
            status: "ok".to_string(),
            store: "up".to_string(),
        }
    }

    fn down() -> Self {
        Self {
            status: "degraded".to_string(),
            store: "down".to_string(),
        }
    }
}

pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthReport::up())),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthReport::down()))
        }
    }
}
