use anyhow::{Context, Result};

use crate::review::session::DEFAULT_IDLE_TTL_MINUTES;

/// Application configuration loaded from environment variables.
/// Nothing is required: the model credential can also be supplied per session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential handed to every new session that doesn't bring its own.
    pub default_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Minutes an untouched session survives before it is evicted.
    pub session_idle_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            default_api_key: optional_env("OPENAI_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_idle_minutes: std::env::var("SESSION_IDLE_MINUTES")
                .unwrap_or_else(|_| DEFAULT_IDLE_TTL_MINUTES.to_string())
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .context("SESSION_IDLE_MINUTES must be a positive number of minutes")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            session_idle_minutes: DEFAULT_IDLE_TTL_MINUTES,
        }
    }
}

/// Blank values count as unset so `OPENAI_API_KEY=` in a .env file disables the default.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
