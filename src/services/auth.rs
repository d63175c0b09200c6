use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::str::FromStr;

use crate::config::AppConfig;
use crate::models::auth::{Claims, TokenResponse};

/// Longest accepted access token lifetime: 30 days.
pub const MAX_TOKEN_MINUTES: i64 = 30 * 24 * 60;

/// Stub login: one fixed credential pair, real signed access tokens.
#[derive(Debug)]
pub struct AuthService {
    stub_email: String,
    stub_password: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        stub_email: &str,
        stub_password: &str,
        secret: &str,
        algorithm: &str,
        expire_minutes: i64,
    ) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|_| AuthError::Config(format!("unknown algorithm {}", algorithm)))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::Config(format!(
                "{:?} requires a key pair, only HMAC algorithms are supported",
                algorithm
            )));
        }

        let token_ttl = Some(expire_minutes)
            .filter(|m| (1..=MAX_TOKEN_MINUTES).contains(m))
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "token expiry must be between 1 and {} minutes, got {}",
                    MAX_TOKEN_MINUTES, expire_minutes
                ))
            })?;

        Ok(Self {
            stub_email: stub_email.to_string(),
            stub_password: stub_password.to_string(),
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.auth_stub_email,
            &config.auth_stub_password,
            &config.secret_key,
            &config.algorithm,
            config.access_token_expire_minutes,
        )
    }

    /// Check credentials and issue a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AuthError> {
        if email != self.stub_email || password != self.stub_password {
            tracing::info!(email = %email, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.issue_token(email)?;
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    fn issue_token(&self, subject: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(AuthError::Token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Auth configuration error: {0}")]
    Config(String),
}
