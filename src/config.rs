/// Service configuration loader - parses geoalerta.toml
///
/// Keeps API endpoints, request windows, cache/retry tuning, notification
/// settings and logging out of the code. Every field has a default, so a
/// missing file or a missing section simply means "use the defaults".
/// Secrets (mail credentials) are never read from this file; only the names
/// of the environment variables that hold them.

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "geoalerta.toml";

/// Hourly history needed to fill the 72-hour accumulation window.
const MIN_PAST_DAYS: u32 = 3;
/// Open-Meteo limits.
const MAX_PAST_DAYS: u32 = 92;
const MAX_FORECAST_DAYS: u32 = 16;
/// Upper bounds for the `[http]` tuning knobs.
const MAX_CACHE_EXPIRE_SECONDS: u64 = 365 * 24 * 3600;
const MAX_BACKOFF_FACTOR: f64 = 60.0;
const MAX_RETRIES: u32 = 20;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// `[forecast]` — what to request from the weather API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    pub past_days: u32,
    pub forecast_days: u32,
    /// IANA timezone name or "auto" (resolve from coordinates).
    pub timezone: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            past_days: 3,
            forecast_days: 1,
            timezone: "auto".to_string(),
        }
    }
}

/// `[http]` — response cache and retry behaviour.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub cache_enabled: bool,
    pub cache_dir: String,
    pub cache_expire_seconds: u64,
    pub retries: u32,
    pub backoff_factor: f64,
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_dir: ".cache".to_string(),
            cache_expire_seconds: 3600,
            retries: 5,
            backoff_factor: 0.2,
            timeout_seconds: 30,
        }
    }
}

/// `[notify]` — where alert notifications go.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Environment variable holding the sender address.
    pub user_env: String,
    /// Environment variable holding the sender secret.
    pub pass_env: String,
    /// Write notifications as files here; log them when unset.
    pub outbox_dir: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            user_env: "EMAIL_USER".to_string(),
            pass_env: "EMAIL_PASS".to_string(),
            outbox_dir: None,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "geoalerta_service=debug".
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Optional file to append log lines to, in addition to stderr.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Root of geoalerta.toml.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub forecast: ForecastConfig,
    pub http: HttpConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading configuration or the point registry.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io { path: String, message: String },
    /// The file is not valid TOML or has the wrong shape.
    Parse { path: String, message: String },
    /// The file parsed but a value is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "Failed to read {}: {}", path, message),
            ConfigError::Parse { path, message } => write!(f, "Failed to parse {}: {}", path, message),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    /// Loads and validates configuration from `path`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.forecast;
        if f.past_days < MIN_PAST_DAYS || f.past_days > MAX_PAST_DAYS {
            return Err(ConfigError::Invalid(format!(
                "forecast.past_days must be between {} and {}, got {}",
                MIN_PAST_DAYS, MAX_PAST_DAYS, f.past_days
            )));
        }
        if f.forecast_days > MAX_FORECAST_DAYS {
            return Err(ConfigError::Invalid(format!(
                "forecast.forecast_days must be at most {}, got {}",
                MAX_FORECAST_DAYS, f.forecast_days
            )));
        }
        if f.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("forecast.base_url must not be empty".to_string()));
        }

        let h = &self.http;
        if !h.backoff_factor.is_finite() || !(0.0..=MAX_BACKOFF_FACTOR).contains(&h.backoff_factor) {
            return Err(ConfigError::Invalid(format!(
                "http.backoff_factor must be between 0 and {}, got {}",
                MAX_BACKOFF_FACTOR, h.backoff_factor
            )));
        }
        if h.retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "http.retries must be at most {}, got {}",
                MAX_RETRIES, h.retries
            )));
        }
        if h.cache_expire_seconds > MAX_CACHE_EXPIRE_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "http.cache_expire_seconds must be at most {}, got {}",
                MAX_CACHE_EXPIRE_SECONDS, h.cache_expire_seconds
            )));
        }
        if h.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("http.timeout_seconds must be positive".to_string()));
        }

        Ok(())
    }
}
