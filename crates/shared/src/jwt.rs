//! JWT token generation and validation.
//!
//! Provides HS256 JWT handling with access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind, TokenPair};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    pub access_token_expires_secs: i64,
    /// Refresh token expiration in seconds.
    pub refresh_token_expires_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_secs: 3600,
            refresh_token_expires_secs: 7 * 24 * 3600,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is valid but of the wrong kind (refresh used as access or vice versa).
    #[error("wrong token kind")]
    WrongKind,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expires_secs", &self.config.access_token_expires_secs)
            .field("refresh_token_expires_secs", &self.config.refresh_token_expires_secs)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn generate(
        &self,
        subject: Uuid,
        business_id: Uuid,
        role: &str,
        kind: TokenKind,
    ) -> Result<String, JwtError> {
        let lifetime = match kind {
            TokenKind::Access => self.config.access_token_expires_secs,
            TokenKind::Refresh => self.config.refresh_token_expires_secs,
        };
        let expires_at = Utc::now() + Duration::seconds(lifetime);
        let claims = Claims::new(subject, business_id, role, kind, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Generates an access token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(
        &self,
        subject: Uuid,
        business_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        self.generate(subject, business_id, role, TokenKind::Access)
    }

    /// Generates a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_refresh_token(
        &self,
        subject: Uuid,
        business_id: Uuid,
        role: &str,
    ) -> Result<String, JwtError> {
        self.generate(subject, business_id, role, TokenKind::Refresh)
    }

    /// Generates an access and refresh token for the same subject.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_pair(
        &self,
        subject: Uuid,
        business_id: Uuid,
        role: &str,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair::new(
            self.generate_access_token(subject, business_id, role)?,
            self.generate_refresh_token(subject, business_id, role)?,
            self.access_token_expires_in(),
        ))
    }

    /// Validates a token and checks it is of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired,
    /// `JwtError::WrongKind` for a token of the other kind, and
    /// `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.kind != expected {
            return Err(JwtError::WrongKind);
        }
        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 3600,
        })
    }

    #[test]
    fn test_validate_access_token() {
        let service = create_test_service();
        let worker_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();

        let token = service
            .generate_access_token(worker_id, owner_id, "worker")
            .unwrap();
        let claims = service.validate_token(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.subject_id(), worker_id);
        assert_eq!(claims.business_id(), owner_id);
        assert_eq!(claims.role, "worker");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = create_test_service();
        let id = Uuid::new_v4();

        let token = service.generate_refresh_token(id, id, "owner").unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenKind::Access),
            Err(JwtError::WrongKind)
        ));
        assert!(service.validate_token(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_generate_pair() {
        let service = create_test_service();
        let id = Uuid::new_v4();

        let pair = service.generate_pair(id, id, "owner").unwrap();

        assert_eq!(pair.expires_in, 900);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: -600,
            refresh_token_expires_secs: 3600,
        });
        let id = Uuid::new_v4();

        let token = service.generate_access_token(id, id, "owner").unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenKind::Access),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let service = create_test_service();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let id = Uuid::new_v4();

        let token = other.generate_access_token(id, id, "owner").unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenKind::Access),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here", TokenKind::Access);
        assert!(result.is_err());
    }
}
