//! Server configuration loaded from environment variables.
//!
//! ## Required
//! - `JWT_SECRET` - token signing secret (at least 32 bytes)
//!
//! ## Optional
//! - `DATABASE_URL` - `PostgreSQL` connection string; without it records are
//!   kept in memory
//! - `BIND_ADDR` - listen address (default: 127.0.0.1:8000)
//! - `MEDIA_ROOT` - directory for uploaded files (default: ./media)
//! - `MEDIA_URL` - URL prefix uploaded files are served under (default: /media/)
//! - `TOKEN_TTL_HOURS` - token lifetime (default: 24)
//! - `SUPERUSER_EMAIL`, `SUPERUSER_PASSWORD` - superuser created at startup
//!   when both are set and the email is not registered yet

use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use log::info;
use thiserror::Error;

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_MEDIA_ROOT, DEFAULT_MEDIA_URL, DEFAULT_TOKEN_TTL_HOURS,
    MIN_JWT_SECRET_LENGTH,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superuser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    pub media_url: String,
    pub token_ttl_hours: i64,
    pub superuser: Option<Superuser>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {MIN_JWT_SECRET_LENGTH} bytes"),
            });
        }

        let token_ttl_hours: i64 = try_load(&var, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        let superuser = match (var("SUPERUSER_EMAIL"), var("SUPERUSER_PASSWORD")) {
            (Some(email), Some(password)) => Some(Superuser { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            jwt_secret,
            bind_addr: try_load(&var, "BIND_ADDR", DEFAULT_BIND_ADDR)?,
            media_root: var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT)),
            media_url: var("MEDIA_URL").unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string()),
            token_ttl_hours,
            superuser,
        })
    }
}

fn try_load<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
