//! Auth delegate: forwards account operations to the identity service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::upstream::{Relayed, UpstreamClient};
use crate::auth::{AuthenticatedUser, CredentialVerifier};
use crate::error::GatewayError;
use crate::store::{ExperienceRecord, ExperienceStore, StoreError};

/// Body returned to the client after a successful signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResult {
    pub signup: bool,
}

#[derive(Debug, Deserialize)]
struct IdentitySignup {
    #[serde(default)]
    signup: bool,
    token: Option<String>,
}

#[derive(Clone)]
pub struct AuthDelegate {
    identity: UpstreamClient,
    store: Arc<dyn ExperienceStore>,
    verifier: Arc<CredentialVerifier>,
}

impl AuthDelegate {
    pub fn new(
        identity: UpstreamClient,
        store: Arc<dyn ExperienceStore>,
        verifier: Arc<CredentialVerifier>,
    ) -> Self {
        Self {
            identity,
            store,
            verifier,
        }
    }

    /// Forward the signup, then create the caller's experience record.
    ///
    /// There is no rollback: if the record cannot be created the account
    /// still exists upstream and [`AuthDelegate::profile`] creates the
    /// record on first read.
    pub async fn signup(&self, credentials: Bytes) -> Result<SignupResult, GatewayError> {
        let relayed = self
            .identity
            .send(Method::POST, &["user", "signup"], None, Some(credentials))
            .await?;
        let answer: IdentitySignup = relayed.json()?;
        if !answer.signup {
            return Err(GatewayError::SignupFailed);
        }

        let token = answer
            .token
            .ok_or_else(|| GatewayError::internal("signup answer carried no token"))?;
        let claims = self.verifier.verify(&token).map_err(|e| {
            GatewayError::internal(format!("identity service issued an unverifiable token: {e}"))
        })?;

        match self.store.create(&claims.user_id).await {
            Ok(_) => {
                tracing::info!(user_id = %claims.user_id, "User signed up");
            }
            Err(StoreError::Conflict) => {
                tracing::info!(user_id = %claims.user_id, "Experience record already present at signup");
            }
            Err(e) => {
                tracing::error!(
                    user_id = %claims.user_id,
                    error = %e,
                    "Signup accepted upstream but experience record was not created"
                );
                return Err(e.into());
            }
        }

        Ok(SignupResult { signup: true })
    }

    pub async fn login(&self, credentials: Bytes) -> Result<Relayed, GatewayError> {
        Ok(self
            .identity
            .send(Method::POST, &["user", "login"], None, Some(credentials))
            .await?)
    }

    /// Upstream profile joined with the local experience counter.
    pub async fn profile(&self, user: &AuthenticatedUser) -> Result<Value, GatewayError> {
        let relayed = self.fetch_profile(user).await?;
        let mut profile: Value = relayed.json()?;

        let Some(fields) = profile.as_object_mut() else {
            return Err(GatewayError::internal("identity profile is not an object"));
        };
        let profile_id = fields
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::internal("identity profile has no _id"))?
            .to_string();
        if profile_id != user.id {
            tracing::warn!(token_user = %user.id, profile_user = %profile_id, "Profile id differs from token subject");
        }

        let record = self.experience_for(&profile_id).await?;
        fields.insert("experience".to_string(), Value::from(record.experience));
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        patch: Bytes,
    ) -> Result<Relayed, GatewayError> {
        Ok(self
            .identity
            .send(Method::PATCH, &["user"], Some(&user.authorization), Some(patch))
            .await?)
    }

    /// Deletes the upstream account only; the experience record is kept.
    pub async fn delete_profile(
        &self,
        user: &AuthenticatedUser,
        body: Bytes,
    ) -> Result<Relayed, GatewayError> {
        Ok(self
            .identity
            .send(Method::DELETE, &["user"], Some(&user.authorization), Some(body))
            .await?)
    }

    /// Raw upstream profile, used as the identity gate for word reads.
    pub async fn fetch_profile(&self, user: &AuthenticatedUser) -> Result<Relayed, GatewayError> {
        Ok(self
            .identity
            .send(Method::GET, &["user"], Some(&user.authorization), None)
            .await?)
    }

    /// Existing record, or a fresh one when signup never created it.
    async fn experience_for(&self, user_id: &str) -> Result<ExperienceRecord, GatewayError> {
        match self.store.get(user_id).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound) => match self.store.create(user_id).await {
                Ok(record) => {
                    tracing::info!(user_id, "Created missing experience record");
                    Ok(record)
                }
                // Lost a race with a concurrent create.
                Err(StoreError::Conflict) => Ok(self.store.get(user_id).await?),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TimeoutConfig;
    use crate::store::InMemoryExperienceStore;

    fn delegate(store: Arc<InMemoryExperienceStore>) -> AuthDelegate {
        let identity =
            UpstreamClient::new("identity", "http://127.0.0.1:9", &TimeoutConfig::default())
                .unwrap();
        AuthDelegate::new(identity, store, Arc::new(CredentialVerifier::new("secret")))
    }

    #[tokio::test]
    async fn test_missing_record_is_created_on_read() {
        let store = Arc::new(InMemoryExperienceStore::new());
        let delegate = delegate(store.clone());

        let record = delegate.experience_for("u1").await.unwrap();
        assert_eq!(record, ExperienceRecord::new("u1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_record_is_returned_unchanged() {
        let store = Arc::new(InMemoryExperienceStore::new());
        store.create("u1").await.unwrap();
        store.increment_by_ten("u1").await.unwrap();
        let delegate = delegate(store.clone());

        assert_eq!(delegate.experience_for("u1").await.unwrap().experience, 10);
    }

    #[test]
    fn test_identity_signup_answer_defaults_to_refused() {
        let answer: IdentitySignup = serde_json::from_str("{}").unwrap();
        assert!(!answer.signup);
        assert!(answer.token.is_none());
    }
}
