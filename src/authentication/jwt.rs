use std::fmt;

use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::error::ApiError;
use crate::schema::{RecordId, User};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: RecordId,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + ttl).timestamp();

        Self {
            user_id: user.id,
            email: user.email.to_owned(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            iat,
            exp,
        }
    }

    pub fn is_expired(&self) -> bool {
        (self.exp - Utc::now().timestamp()).is_negative()
    }
}

/// Authenticated caller, extracted once per request and passed down explicitly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: RecordId,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        Self {
            user_id: value.user_id,
            email: value.email,
            is_staff: value.is_staff,
            is_superuser: value.is_superuser,
        }
    }
}

#[derive(Clone)]
pub struct TokenSigner {
    key: Hmac<Sha256>,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, ApiError> {
        let key: Hmac<Sha256> =
            Hmac::new_from_slice(secret).map_err(|e| ApiError::Token(e.to_string()))?;

        Ok(Self { key, ttl })
    }

    pub fn generate(&self, user: &User) -> Result<String, ApiError> {
        JwtSessionData::new(user, self.ttl)
            .sign_with_key(&self.key)
            .map_err(|e| ApiError::Token(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionData, ApiError> {
        let session: JwtSessionData = token
            .verify_with_key(&self.key)
            .map_err(|_| ApiError::unauthorized("Invalid token."))?;

        if session.is_expired() {
            return Err(ApiError::unauthorized("Token has expired."));
        }

        Ok(session.into())
    }
}
