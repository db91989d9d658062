//! Configuration management for the study buddy backend.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded first when present):
//! - `GEMINI_API_KEY` - Optional. Upstream credential. Task endpoints answer 503 without it.
//! - `GEMINI_MODEL` - Optional. Model identifier. Defaults to `gemini-2.5-flash`.
//! - `GEMINI_API_BASE` - Optional. Upstream base URL.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `5000`.
//! - `MAX_RETRIES` - Optional. Total upstream attempts per task. Defaults to `3`.
//! - `UPSTREAM_TIMEOUT_SECS` - Optional. Per-attempt upstream timeout. Defaults to `60`.
//! - `RATE_LIMIT_WINDOW_SECS` - Optional. Inbound rate limit window. Defaults to `60`.
//! - `RATE_LIMIT_MAX_REQUESTS` - Optional. Requests per client per window. Defaults to `10`.
//! - `BODY_LIMIT_BYTES` - Optional. Maximum JSON body size. Defaults to `102400`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::{RetryConfig, DEFAULT_API_BASE};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Inbound rate limiting configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Length of one counting window
    pub window: Duration,

    /// Requests allowed per client within one window
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 10,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Upstream base URL
    pub api_base: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Upstream retry policy
    pub retry: RetryConfig,

    /// Per-attempt upstream timeout
    pub upstream_timeout: Duration,

    /// Inbound rate limiting
    pub rate_limit: RateLimitConfig,

    /// Maximum request body size in bytes
    pub body_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env_parse("PORT", 5000u16)?;
        let max_attempts = env_parse("MAX_RETRIES", 3u32)?;
        let upstream_timeout = Duration::from_secs(env_parse("UPSTREAM_TIMEOUT_SECS", 60u64)?);

        let rate_limit = RateLimitConfig {
            window: Duration::from_secs(env_parse("RATE_LIMIT_WINDOW_SECS", 60u64)?),
            max_requests: env_parse("RATE_LIMIT_MAX_REQUESTS", 10u32)?,
        };

        let body_limit = env_parse("BODY_LIMIT_BYTES", 100 * 1024usize)?;

        Ok(Self {
            api_key,
            model,
            api_base,
            host,
            port,
            retry: RetryConfig::new(max_attempts),
            upstream_timeout,
            rate_limit,
            body_limit,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            api_key,
            model,
            api_base: DEFAULT_API_BASE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            retry: RetryConfig::default(),
            upstream_timeout: Duration::from_secs(60),
            rate_limit: RateLimitConfig::default(),
            body_limit: 100 * 1024,
        }
    }

    /// Whether an upstream credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u16>("PORT", " 8080 ").unwrap(), 8080);

        let err = parse_value::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for PORT:"));
    }

    #[test]
    fn test_new_has_sane_defaults() {
        let config = Config::new(None, DEFAULT_MODEL.to_string());
        assert!(!config.has_api_key());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }
}
