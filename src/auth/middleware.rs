//! Authentication middleware and the request-scoped user context.
//!
//! The middleware validates the bearer token once per request and attaches an
//! [`AuthenticatedUser`]. Handlers consume the context through the extractor,
//! which rejects with `USER_NOT_AUTHENTICATED` when nothing was attached.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::verifier::{CredentialVerifier, VerifyError};
use crate::error::GatewayError;

/// Context attached to authenticated requests.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    /// Identifier shared with the identity service and the experience store.
    pub id: String,
    /// The original `Authorization` header, forwarded upstream unchanged.
    pub authorization: HeaderValue,
}

pub async fn authenticate(
    State(verifier): State<Arc<CredentialVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_headers(&verifier, request.headers()) {
        Ok(Some(user)) => {
            tracing::debug!(user_id = %user.id, "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        // No credentials: handlers that need a user reject on their own.
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, path = %request.uri().path(), "Rejected bearer token");
            GatewayError::InvalidCredential(e).into_response()
        }
    }
}

/// Verify the bearer token in `headers`, if any.
pub fn authenticate_headers(
    verifier: &CredentialVerifier,
    headers: &HeaderMap,
) -> Result<Option<AuthenticatedUser>, VerifyError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(VerifyError::Malformed)?;

    let claims = verifier.verify(token)?;
    Ok(Some(AuthenticatedUser {
        id: claims.user_id,
        authorization: value.clone(),
    }))
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(GatewayError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::UserClaims;

    const SECRET: &str = "middleware-secret";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_yields_no_user() {
        let verifier = CredentialVerifier::new(SECRET);
        assert!(authenticate_headers(&verifier, &HeaderMap::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_valid_bearer_attaches_user() {
        let verifier = CredentialVerifier::new(SECRET);
        let token = verifier.issue(&UserClaims::new("u-1")).unwrap();
        let header = format!("Bearer {}", token);

        let user = authenticate_headers(&verifier, &headers_with(&header))
            .unwrap()
            .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.authorization, header.as_str());
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let verifier = CredentialVerifier::new(SECRET);
        let token = verifier.issue(&UserClaims::new("u-2")).unwrap();
        let user = authenticate_headers(&verifier, &headers_with(&format!("bearer {}", token)))
            .unwrap()
            .unwrap();
        assert_eq!(user.id, "u-2");
    }

    #[test]
    fn test_non_bearer_header_is_malformed() {
        let verifier = CredentialVerifier::new(SECRET);
        assert_eq!(
            authenticate_headers(&verifier, &headers_with("Basic dXNlcjpwdw==")).unwrap_err(),
            VerifyError::Malformed
        );
        assert_eq!(
            authenticate_headers(&verifier, &headers_with("Bearer ")).unwrap_err(),
            VerifyError::Malformed
        );
    }

    #[test]
    fn test_token_signed_elsewhere_is_rejected() {
        let verifier = CredentialVerifier::new(SECRET);
        let foreign = CredentialVerifier::new("other").issue(&UserClaims::new("u-3")).unwrap();
        assert_eq!(
            authenticate_headers(&verifier, &headers_with(&format!("Bearer {}", foreign)))
                .unwrap_err(),
            VerifyError::InvalidSignature
        );
    }
}
