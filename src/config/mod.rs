//! Configuration management for Quire.
//!
//! Configuration is read from a TOML file (`--config <path>`, or
//! `~/.config/quire/config.toml` when present) and then overlaid with the
//! environment variables used by container deployments. Missing fields fall
//! back to defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::password::DEFAULT_ITERATIONS;
use crate::auth::token::DEFAULT_TOKEN_TTL_SECS;
use crate::fetcher::DEFAULT_FETCH_TIMEOUT;

/// Signing secret used when nothing else is configured. Fine for local
/// development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Upper bound for every configured duration (ten years).
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 86400;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub allow_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allow_cors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("quire.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub password_iterations: u32,
    /// Administrator created at startup when no admin exists yet
    pub default_admin_email: String,
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            password_iterations: DEFAULT_ITERATIONS,
            default_admin_email: "admin@example.com".to_string(),
            default_admin_password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Polling interval in seconds (default: 600 = 10 minutes)
    pub interval_secs: u64,
    /// Per-request timeout for feed downloads
    pub fetch_timeout_secs: u64,
    /// Whether to run a cycle immediately at startup
    pub run_on_start: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            run_on_start: false,
        }
    }
}

impl Config {
    /// Load the file layer, then the environment layer, then validate.
    ///
    /// An explicitly given path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/quire/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("quire").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay values from the environment. `lookup` returns `None` for unset
    /// variables; empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(cors) = get("ALLOW_CORS") {
            self.server.allow_cors = cors == "true";
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.path = database_path_from_url(&url);
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(email) = get("DEFAULT_ADMIN_EMAIL") {
            self.auth.default_admin_email = email;
        }
        if let Some(password) = get("DEFAULT_ADMIN_PASSWORD") {
            self.auth.default_admin_password = password;
        }
        if let Some(interval) = get("FEED_POLL_INTERVAL") {
            self.ingest.interval_secs =
                parse_interval(&interval).map_err(|_| ConfigError::Invalid {
                    key: "FEED_POLL_INTERVAL",
                    value: interval.clone(),
                })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid {
                key: "auth.jwt_secret",
                value: String::new(),
            });
        }
        if !(1..=MAX_DURATION_SECS as i64).contains(&self.auth.token_ttl_secs) {
            return Err(ConfigError::Invalid {
                key: "auth.token_ttl_secs",
                value: self.auth.token_ttl_secs.to_string(),
            });
        }
        if !(1..=MAX_DURATION_SECS).contains(&self.ingest.interval_secs) {
            return Err(ConfigError::Invalid {
                key: "ingest.interval_secs",
                value: self.ingest.interval_secs.to_string(),
            });
        }
        if !(1..=MAX_DURATION_SECS).contains(&self.ingest.fetch_timeout_secs) {
            return Err(ConfigError::Invalid {
                key: "ingest.fetch_timeout_secs",
                value: self.ingest.fetch_timeout_secs.to_string(),
            });
        }
        if self.auth.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("Using the development JWT secret; set JWT_SECRET in production");
        }
        Ok(())
    }
}

/// Accepts a bare path or the `file:`/`sqlite://` URL forms, dropping any
/// query string.
fn database_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    PathBuf::from(path)
}

/// Parse interval string like "10m", "1h", "30s", "1d" or raw seconds
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (digits, unit, name) = if let Some(hours) = s.strip_suffix('h') {
        (hours, 3600, "hours")
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, 60, "minutes")
    } else if let Some(days) = s.strip_suffix('d') {
        (days, 86400, "days")
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1, "seconds")
    } else {
        return s
            .parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '10m', '1h', '1d'", s));
    };

    let count = digits
        .parse::<u64>()
        .map_err(|_| format!("Invalid {}: {}", name, digits))?;
    count
        .checked_mul(unit)
        .ok_or_else(|| format!("Interval too large: {}", s))
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
