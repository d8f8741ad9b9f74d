use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::core::errors::AppError;
use crate::shared::core::identity::{AuthUser, Role};
use crate::shared::guards::authentication::TokenVerifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<JwtError> for AppError {
    fn from(error: JwtError) -> Self {
        match error {
            JwtError::Encoding(_) => {
                tracing::error!(%error, "access token could not be issued");
                AppError::Internal("Internal server error".into())
            }
            JwtError::Invalid(_) => AppError::unauthenticated(),
        }
    }
}

/// HS256 access tokens.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtCodec {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &AuthUser) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::Invalid(e.to_string()))
    }
}

impl TokenVerifier for JwtCodec {
    fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let claims = self.decode(token).map_err(|error| {
            tracing::debug!(%error, "rejected access token");
            AppError::from(error)
        })?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::unauthenticated())?;
        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role,
        })
    }
}
