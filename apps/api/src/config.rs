use anyhow::{Context, Result};

use crate::llm_client::GEMINI_API_BASE;
use crate::photos::UNSPLASH_API_BASE;
use crate::session::store::DEFAULT_IDLE_TTL_MINUTES;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional at startup: their absence is reported
/// per request as a configuration error instead of aborting the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub gemini_api_url: String,
    pub unsplash_api_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Minutes a session may sit untouched before it is evicted.
    pub session_idle_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            google_api_key: optional_env("GOOGLE_API_KEY"),
            unsplash_access_key: optional_env("UNSPLASH_ACCESS_KEY"),
            gemini_api_url: optional_env("GEMINI_API_URL")
                .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            unsplash_api_url: optional_env("UNSPLASH_API_URL")
                .unwrap_or_else(|| UNSPLASH_API_BASE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_idle_ttl_minutes: match optional_env("SESSION_IDLE_TTL_MINUTES") {
                Some(v) => v
                    .parse::<i64>()
                    .ok()
                    .filter(|minutes| *minutes > 0)
                    .context("SESSION_IDLE_TTL_MINUTES must be a positive number of minutes")?,
                None => DEFAULT_IDLE_TTL_MINUTES,
            },
        })
    }
}

/// Reads an env var, treating unset and blank values the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
