//! Bearer token verification.
//!
//! # Pre-conditions
//! - The secret must be non-empty.
//!
//! # Post-conditions
//! - On success, returns the claims carrying the user identifier.
//! - Every failure (signature, expiry, malformed input) is a `VerifyError`,
//!   which the HTTP layer reports uniformly as an invalid credential.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by tokens the identity service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserClaims {
    /// User identifier; the identity service names it `userID`.
    #[serde(rename = "userID")]
    pub user_id: String,

    /// Expiry (seconds since epoch). Validated when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl UserClaims {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            exp: None,
        }
    }

    pub fn expiring_at(mut self, exp: u64) -> Self {
        self.exp = Some(exp);
        self
    }
}

/// Claims as they arrive on the wire. `userID` wins over `sub` when both
/// are present; any other registered claim is ignored.
#[derive(Debug, Deserialize)]
struct WireClaims {
    #[serde(rename = "userID")]
    user_id: Option<String>,
    sub: Option<String>,
    exp: Option<u64>,
}

impl WireClaims {
    fn into_claims(self) -> Result<UserClaims, VerifyError> {
        let user_id = self
            .user_id
            .filter(|id| !id.is_empty())
            .or(self.sub.filter(|id| !id.is_empty()))
            .ok_or(VerifyError::MissingUserId)?;
        Ok(UserClaims {
            user_id,
            exp: self.exp,
        })
    }
}

/// Error returned when token verification fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token carries no user identifier")]
    MissingUserId,
    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Verifies HS256 tokens against the server-held secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens from the identity service do not always carry `exp`.
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<UserClaims, VerifyError> {
        decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(map_jwt_error)?
            .claims
            .into_claims()
    }

    /// Sign claims with the same secret. Used by tests and the operator CLI.
    pub fn issue(&self, claims: &UserClaims) -> Result<String, VerifyError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| VerifyError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}

/// Verify `token` with `secret`.
pub fn verify(token: &str, secret: &str) -> Result<UserClaims, VerifyError> {
    CredentialVerifier::new(secret).verify(token)
}

/// Sign `claims` with `secret`.
pub fn issue_token(claims: &UserClaims, secret: &str) -> Result<String, VerifyError> {
    CredentialVerifier::new(secret).issue(claims)
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::MissingRequiredClaim(_) => VerifyError::MissingUserId,
        _ => VerifyError::Malformed,
    }
}
