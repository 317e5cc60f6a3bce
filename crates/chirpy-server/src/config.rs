//! Configuration loading

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Signing secret shipped in the defaults; never fit for production
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Longest accepted access token lifetime (30 days)
const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;
/// Longest accepted refresh token lifetime (10 years)
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;
/// Largest accepted clock skew allowance
const MAX_LEEWAY_SECS: i64 = 300;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served on `/app`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// API key expected from the payment provider; empty hides the webhook
    #[serde(default)]
    pub polka_key: String,
    /// Deployment platform; `dev` unlocks the admin reset
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    /// Clock skew tolerated when checking access token expiry
    #[serde(default)]
    pub leeway_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            polka_key: String::new(),
            platform: default_platform(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
            leeway_secs: 0,
        }
    }
}

impl AuthConfig {
    pub fn access_token_ttl(&self) -> Result<TimeDelta> {
        bounded_duration(
            "auth.access_token_ttl_secs",
            self.access_token_ttl_secs,
            1,
            MAX_ACCESS_TOKEN_TTL_SECS,
            TimeDelta::try_seconds,
        )
    }

    pub fn refresh_token_ttl(&self) -> Result<TimeDelta> {
        bounded_duration(
            "auth.refresh_token_ttl_days",
            self.refresh_token_ttl_days,
            1,
            MAX_REFRESH_TOKEN_TTL_DAYS,
            TimeDelta::try_days,
        )
    }

    pub fn leeway(&self) -> Result<TimeDelta> {
        bounded_duration(
            "auth.leeway_secs",
            self.leeway_secs,
            0,
            MAX_LEEWAY_SECS,
            TimeDelta::try_seconds,
        )
    }
}

/// Convert a configured amount to a duration, rejecting values outside `min..=max`
fn bounded_duration(
    name: &str,
    value: i64,
    min: i64,
    max: i64,
    to_duration: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta> {
    if !(min..=max).contains(&value) {
        bail!("{} must be between {} and {}, got {}", name, min, max, value);
    }
    to_duration(value).with_context(|| format!("{} is out of range", name))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    ".".to_string()
}

fn default_db_path() -> String {
    "./data/chirpy.db".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_platform() -> String {
    "prod".to_string()
}

fn default_access_token_ttl_secs() -> i64 {
    3600
}

fn default_refresh_token_ttl_days() -> i64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        self.auth.access_token_ttl()?;
        self.auth.refresh_token_ttl()?;
        self.auth.leeway()?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            );
        }
        Ok(())
    }

    /// Whether the shipped signing secret is still in use
    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Log warnings for settings that are unsafe outside development
    pub fn warn_insecure(&self) {
        if self.uses_default_secret() {
            warn!("auth.jwt_secret is the default value; set JWT_SECRET before deploying");
        }
        if self.auth.polka_key.is_empty() {
            warn!("auth.polka_key is not set; payment webhooks will be ignored");
        }
        if self.auth.platform == chirpy_auth::guard::DEV_PLATFORM {
            warn!("Running on the dev platform; POST /admin/reset deletes all users");
        }
    }
}
