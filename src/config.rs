//! Application Configuration
//! Mission: Load all runtime settings once at startup, from the environment

use anyhow::{Context, Result};
use std::env;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_PATH: &str = "autolot.db";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_EXCHANGE_RATE_API_BASE: &str = "https://api.exchangerate-api.com/v4/latest";

/// Process-wide configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: String,
    /// Shared token signing secret. Required; never hard-coded.
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub exchange_rate_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set (refusing to start with no signing secret)")?;

        let token_ttl_hours = get("TOKEN_TTL_HOURS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_path: get("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            jwt_secret,
            token_ttl_hours,
            exchange_rate_api_base: get("EXCHANGE_RATE_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_API_BASE.to_string()),
        })
    }
}
