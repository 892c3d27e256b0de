pub mod password;
pub mod policy;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::{Account, Role};

pub use policy::{AccessPolicy, Capability};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub name: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verified caller, decoded from a token's signed claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(rename = "idUser")]
    pub subject_id: i64,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Role {role} lacks the {capability} capability")]
    InsufficientRole { role: Role, capability: Capability },

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// Issued bearer token and its lifetime in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Signs and verifies HS256 bearer tokens with the server-held secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            security.jwt_secret.as_bytes(),
            Duration::minutes(security.jwt_expiry_minutes),
        )
    }

    pub fn issue(&self, account: &Account) -> Result<IssuedToken, AuthError> {
        self.issue_at(account, Utc::now().timestamp())
    }

    fn issue_at(&self, account: &Account, now: i64) -> Result<IssuedToken, AuthError> {
        let claims = Claims {
            sub: account.id.to_string(),
            name: account.username.clone(),
            role: account.role.as_str().to_string(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken { token, expires_in: self.ttl.num_seconds() })
    }

    /// Validates signature and expiry, then decodes the identity. No side effects.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        let claims = data.claims;

        let subject_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidCredential("malformed subject".to_string()))?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        Ok(Identity { subject_id, username: claims.name, role })
    }

    /// Verifies the value of an `Authorization` header.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_bearer_token(header)?;
        self.verify(token)
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    const BEARER_PREFIX: &str = "Bearer ";

    let header = header.ok_or(AuthError::Unauthenticated("Missing Authorization header"))?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::Unauthenticated("Authorization header must use Bearer token format"))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::Unauthenticated("Bearer token is empty"));
    }
    Ok(token)
}
