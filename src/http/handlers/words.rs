//! `/words` handlers.

use axum::extract::{Path, State};

use crate::auth::AuthenticatedUser;
use crate::delegates::Relayed;
use crate::error::GatewayError;
use crate::http::server::AppState;

pub async fn list_words(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Relayed, GatewayError> {
    state.words.list_words(&user).await
}

pub async fn get_word(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Relayed, GatewayError> {
    state.words.get_word(&user, &id).await
}
