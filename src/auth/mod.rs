//! Authentication for the admin API.
//!
//! JWT access/refresh token pairs (HS256) with an in-memory revocation list
//! consulted on every validation. Logout and refresh rotation both go through
//! the revocation list, so a revoked pair stays dead for its whole lifetime
//! without a storage round-trip.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::user;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user ID)
    pub email: Option<String>, // User's email (absent on refresh tokens)
    pub role: Option<String>,  // User's role (absent on refresh tokens)
    pub jti: String,          // JWT ID (unique identifier for this token)
    pub iat: i64,             // Issued at time
    pub exp: i64,             // Expiration time
    pub nbf: i64,             // Not valid before time
    pub iss: String,          // Issuer
    pub aud: String,          // Audience
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer: "laundromat-api".to_string(),
            jwt_audience: "laundromat-admin".to_string(),
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Token blacklist entry
#[derive(Clone, Debug)]
struct RevokedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

/// Issues and validates token pairs
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    revoked_tokens: Arc<RwLock<Vec<RevokedToken>>>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            revoked_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Generate an access/refresh token pair for a user
    pub fn generate_token_pair(&self, account: &user::Model) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let access_claims = Claims {
            sub: account.id.to_string(),
            email: Some(account.email.clone()),
            role: Some(account.role.clone()),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh token carries the minimum: just the subject.
        let refresh_claims = Claims {
            sub: account.id.to_string(),
            email: None,
            role: None,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let access_token = encode(&Header::new(Algorithm::HS256), &access_claims, &key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;
        let refresh_token = encode(&Header::new(Algorithm::HS256), &refresh_claims, &key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Revoke a token for the remainder of its lifetime
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;
        self.revoke_jti(&claims.jti, claims.exp).await;
        Ok(())
    }

    /// Add a token id to the revocation list until `exp`
    pub async fn revoke_jti(&self, jti: &str, exp: i64) {
        let expiry = DateTime::<Utc>::from_timestamp(exp, 0).unwrap_or_else(Utc::now);
        let mut revoked = self.revoked_tokens.write().await;
        revoked.push(RevokedToken {
            jti: jti.to_string(),
            expiry,
        });

        let now = Utc::now();
        revoked.retain(|t| t.expiry > now);
    }

    async fn is_token_revoked(&self, token_id: &str) -> bool {
        let revoked = self.revoked_tokens.read().await;
        revoked.iter().any(|t| t.jti == token_id)
    }
}

/// Authenticated caller extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub token_id: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(user::ROLE_ADMIN)
    }
}

#[axum::async_trait]
impl FromRequestParts<crate::AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = state.auth.validate_token(token).await?;

        // Refresh tokens never authenticate requests.
        if claims.email.is_none() {
            return Err(AuthError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::TokenCreation(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = crate::errors::ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            errors: None,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for crate::errors::ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                crate::errors::ServiceError::InternalError(msg)
            }
            other => crate::errors::ServiceError::Unauthorized(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "unit_test_secret_key_that_is_definitely_long_enough_for_hs256_0001".into(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        ))
    }

    fn test_account() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "jane@example.com".into(),
            full_name: "Jane Tester".into(),
            phone_number: "+441234567890".into(),
            password_hash: String::new(),
            role: user::ROLE_USER.into(),
            is_email_verified: true,
            is_active: true,
            email_verification_token: None,
            password_reset_token: None,
            address_line_1: None,
            address_line_2: None,
            city: None,
            country: None,
            postcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_pair_roundtrip() {
        let service = test_service();
        let account = test_account();

        let pair = service.generate_token_pair(&account).unwrap();
        let access = service.validate_token(&pair.access_token).await.unwrap();
        assert_eq!(access.sub, account.id.to_string());
        assert_eq!(access.email.as_deref(), Some("jane@example.com"));

        let refresh = service.validate_token(&pair.refresh_token).await.unwrap();
        assert_eq!(refresh.sub, account.id.to_string());
        assert!(refresh.email.is_none());
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = test_service();
        let pair = service.generate_token_pair(&test_account()).unwrap();

        service.revoke_token(&pair.refresh_token).await.unwrap();
        let result = service.validate_token(&pair.refresh_token).await;
        assert_matches!(result, Err(AuthError::RevokedToken));

        // The access token from the same pair is untouched.
        assert!(service.validate_token(&pair.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let service = test_service();
        let result = service.validate_token("not-a-jwt").await;
        assert_matches!(result, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let issuing = test_service();
        let validating = AuthService::new(AuthConfig::new(
            "a_completely_different_secret_key_that_is_also_long_enough_xx02".into(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        ));

        let pair = issuing.generate_token_pair(&test_account()).unwrap();
        let result = validating.validate_token(&pair.access_token).await;
        assert_matches!(result, Err(AuthError::InvalidToken));
    }
}
