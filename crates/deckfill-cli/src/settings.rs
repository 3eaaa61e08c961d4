//! Settings file
//!
//! `deckfill.toml` holds engine policy, gateway endpoints and the log
//! level. Every section and field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use deckfill_core::EngineConfig;
use deckfill_gateway::{ClientError, RetryPolicy, SlidesClient, DEFAULT_DRIVE_URL, DEFAULT_SLIDES_URL};
use serde::{Deserialize, Serialize};

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "deckfill.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine policy
    pub engine: EngineConfig,
    /// Remote API access
    pub gateway: GatewaySettings,
    /// Log output
    pub logging: LoggingSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from `path`, or from `deckfill.toml` in the working
    /// directory when it exists, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))?;
        settings
            .engine
            .validate()
            .with_context(|| format!("Invalid [engine] settings in {}", path.display()))?;
        Ok(settings)
    }
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Slides API base URL
    pub slides_url: String,
    /// Drive API base URL
    pub drive_url: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retry policy for rate-limited and transient failures
    pub retry: RetrySettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            slides_url: DEFAULT_SLIDES_URL.to_string(),
            drive_url: DEFAULT_DRIVE_URL.to_string(),
            token_env: "DECKFILL_ACCESS_TOKEN".to_string(),
            timeout_secs: 60,
            retry: RetrySettings::default(),
        }
    }
}

impl GatewaySettings {
    /// Build an authenticated client, reading the token from `token_env`
    pub fn client(&self) -> Result<SlidesClient> {
        let token = std::env::var(&self.token_env)
            .map_err(|_| ClientError::MissingToken(self.token_env.clone()))?;
        let client = SlidesClient::with_urls(&self.slides_url, &self.drive_url)?
            .with_timeout(Duration::from_secs(self.timeout_secs))?
            .with_token(token)
            .with_retry(self.retry.policy());
        Ok(client)
    }
}

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per call, the first included
    pub max_attempts: u32,
    /// Wait before the first retry, doubled after each failure
    pub initial_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl RetrySettings {
    /// The gateway retry policy these settings describe
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
