use std::env;
use thiserror::Error;

use crate::constants::*;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY environment variable is required")]
    MissingJwtSecret,
    #[error("Invalid JWT secret: must be at least {0} bytes long")]
    InvalidJwtSecret(usize),
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid token expiry: {0}")]
    InvalidTokenExpiry(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let data_path = lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(port));
        }

        let jwt_secret = lookup("JWT_SECRET_KEY").ok_or(ConfigError::MissingJwtSecret)?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InvalidJwtSecret(MIN_JWT_SECRET_LENGTH));
        }

        let token_expiry_minutes = match lookup("TOKEN_EXPIRY_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if (1..=MAX_TOKEN_EXPIRY_MINUTES).contains(&minutes) => minutes,
                _ => return Err(ConfigError::InvalidTokenExpiry(raw)),
            },
            None => DEFAULT_TOKEN_EXPIRY_MINUTES,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            host,
            port,
            data_path,
            jwt_secret,
            token_expiry_minutes,
            cors_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|origin| origin == "*")
    }
}
