//! Words delegate: read-only access to the words catalogue.

use axum::http::Method;

use super::auth::AuthDelegate;
use super::upstream::{Relayed, UpstreamClient};
use crate::auth::AuthenticatedUser;
use crate::error::GatewayError;

/// Confirms the caller with the identity service before every catalogue read.
#[derive(Clone)]
pub struct WordsDelegate {
    auth: AuthDelegate,
    words: UpstreamClient,
}

impl WordsDelegate {
    pub fn new(auth: AuthDelegate, words: UpstreamClient) -> Self {
        Self { auth, words }
    }

    pub async fn list_words(&self, user: &AuthenticatedUser) -> Result<Relayed, GatewayError> {
        self.confirm_identity(user).await?;
        Ok(self.words.send(Method::GET, &["words"], None, None).await?)
    }

    pub async fn get_word(
        &self,
        user: &AuthenticatedUser,
        word_id: &str,
    ) -> Result<Relayed, GatewayError> {
        self.confirm_identity(user).await?;
        Ok(self
            .words
            .send(Method::GET, &["words", word_id], None, None)
            .await?)
    }

    /// Any non-empty profile counts as authenticated.
    async fn confirm_identity(&self, user: &AuthenticatedUser) -> Result<(), GatewayError> {
        let profile = self.auth.fetch_profile(user).await?;
        if profile.is_empty_payload() {
            return Err(GatewayError::internal(format!(
                "identity service returned no profile for {}",
                user.id
            )));
        }
        Ok(())
    }
}
