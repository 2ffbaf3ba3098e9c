//! Bearer-token authentication.
//!
//! Credentials are HS256-signed claims with an expiry, resolved to a stable
//! user id. The token issuer lives outside this core; [`TokenVerifier::issue`]
//! exists for that issuer and for tests. A configured fallback identity can
//! stand in when resolution fails — a non-production convenience only, not a
//! security boundary.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::UserId;

/// Errors produced while resolving or issuing credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No Authorization header was supplied.
    #[error("Authentication required")]
    MissingCredentials,

    /// The Authorization header is not a bearer token.
    #[error("Invalid token format")]
    InvalidFormat,

    /// The token failed signature or expiry validation.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token creation failed.
    #[error("Failed to create token: {0}")]
    TokenCreation(String),
}

/// Signed token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The identity a credential resolved to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: String,
}

/// Verifies (and, for the external issuer and tests, creates) bearer tokens.
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    fallback_user: Option<UserId>,
}

impl TokenVerifier {
    /// Creates a verifier over a shared HS256 secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            fallback_user: None,
        }
    }

    /// Configures a fallback identity used when token resolution fails.
    pub fn with_fallback_user(mut self, user_id: UserId) -> Self {
        self.fallback_user = Some(user_id);
        self
    }

    /// Signs a token for `user_id`, valid for `ttl_seconds` from now.
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        role: &str,
        ttl_seconds: i64,
    ) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_i64(),
            username: username.to_string(),
            role: role.to_string(),
            iat,
            exp: iat + ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Resolves a raw token string to an identity.
    pub fn resolve(&self, token: &str) -> Result<AuthUser, AuthError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(AuthUser {
                user_id: UserId::new(data.claims.sub),
                role: data.claims.role,
            }),
            Err(err) => {
                if let Some(user_id) = self.fallback_user {
                    tracing::warn!(error = %err, %user_id, "token resolution failed, using fallback identity");
                    return Ok(AuthUser {
                        user_id,
                        role: "user".to_string(),
                    });
                }
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Resolves the request's `Authorization: Bearer` header to an identity.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;
        self.resolve(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_resolves_to_the_same_user() {
        let verifier = TokenVerifier::new("test-secret");
        let token = verifier
            .issue(UserId::new(3), "casey", "user", 3600)
            .unwrap();
        let user = verifier.resolve(&token).unwrap();
        assert_eq!(user.user_id, UserId::new(3));
        assert_eq!(user.role, "user");
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new("test-secret");
        // Well past any validation leeway.
        let token = verifier
            .issue(UserId::new(3), "casey", "user", -7200)
            .unwrap();
        assert!(matches!(
            verifier.resolve(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenVerifier::new("secret-a");
        let verifier = TokenVerifier::new("secret-b");
        let token = issuer.issue(UserId::new(3), "casey", "user", 3600).unwrap();
        assert!(verifier.resolve(&token).is_err());
    }

    #[test]
    fn fallback_identity_applies_only_on_resolution_failure() {
        let verifier = TokenVerifier::new("test-secret").with_fallback_user(UserId::new(1));

        let user = verifier.resolve("not-a-token").unwrap();
        assert_eq!(user.user_id, UserId::new(1));

        let token = verifier
            .issue(UserId::new(3), "casey", "user", 3600)
            .unwrap();
        let user = verifier.resolve(&token).unwrap();
        assert_eq!(user.user_id, UserId::new(3));
    }

    #[test]
    fn missing_and_malformed_headers_are_distinguished() {
        let verifier = TokenVerifier::new("test-secret");

        let headers = HeaderMap::new();
        assert!(matches!(
            verifier.authenticate(&headers),
            Err(AuthError::MissingCredentials)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert!(matches!(
            verifier.authenticate(&headers),
            Err(AuthError::InvalidFormat)
        ));
    }
}
