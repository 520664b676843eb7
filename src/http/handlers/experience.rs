//! `/experience` handlers. These talk to the store directly; the caller is
//! always the authenticated user.

use axum::{extract::State, http::StatusCode, Json};

use crate::auth::AuthenticatedUser;
use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::store::ExperienceRecord;

pub async fn get_experience(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ExperienceRecord>, GatewayError> {
    Ok(Json(state.store.get(&user.id).await?))
}

pub async fn create_experience(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<ExperienceRecord>), GatewayError> {
    let record = state.store.create(&user.id).await?;
    tracing::info!(user_id = %user.id, "Experience record created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn increment_experience(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<ExperienceRecord>), GatewayError> {
    let record = state.store.increment_by_ten(&user.id).await?;
    tracing::debug!(user_id = %user.id, experience = record.experience, "Experience gained");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_experience(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, GatewayError> {
    state.store.delete(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
