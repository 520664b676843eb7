//! `/user` handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::auth::AuthenticatedUser;
use crate::delegates::{Relayed, SignupResult};
use crate::error::GatewayError;
use crate::http::server::AppState;

pub async fn signup(
    State(state): State<AppState>,
    credentials: Bytes,
) -> Result<(StatusCode, Json<SignupResult>), GatewayError> {
    let result = state.auth.signup(credentials).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn login(
    State(state): State<AppState>,
    credentials: Bytes,
) -> Result<Relayed, GatewayError> {
    state.auth.login(credentials).await
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.auth.profile(&user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    patch: Bytes,
) -> Result<Relayed, GatewayError> {
    state.auth.update_profile(&user, patch).await
}

pub async fn delete_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Bytes,
) -> Result<Relayed, GatewayError> {
    state.auth.delete_profile(&user, body).await
}
