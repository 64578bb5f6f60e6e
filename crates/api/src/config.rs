//! Environment configuration for the Panorama dashboards API.
//!
//! | Env Var                  | Required | Default   |
//! |--------------------------|----------|-----------|
//! | `DATABASE_URL`           | **yes**  | --        |
//! | `JWT_SECRET`             | **yes**  | --        |
//! | `JWT_ACCESS_EXPIRY_MINS` | no       | `15`      |
//! | `HOST`                   | no       | `0.0.0.0` |
//! | `PORT`                   | no       | `8080`    |
//! | `CORS_ORIGINS`           | no       | none      |
//! | `REQUEST_TIMEOUT_SECS`   | no       | `30`      |
//! | `SHUTDOWN_TIMEOUT_SECS`  | no       | `30`      |
//!
//! `DATABASE_URL` is read by `main` directly; it never reaches the router.
//! `CORS_ORIGINS` is comma separated. Left unset, no cross-origin caller is
//! allowed, which suits API clients that talk to the server directly.

use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to make credentialed cross-origin calls.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            cors_origins: get("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            request_timeout_secs: parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?,
            shutdown_timeout_secs: parse_or(
                get("SHUTDOWN_TIMEOUT_SECS"),
                "SHUTDOWN_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?,
            jwt: JwtConfig {
                secret,
                access_token_expiry_mins: parse_or(
                    get("JWT_ACCESS_EXPIRY_MINS"),
                    "JWT_ACCESS_EXPIRY_MINS",
                    DEFAULT_ACCESS_EXPIRY_MINS,
                )?,
            },
        })
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
