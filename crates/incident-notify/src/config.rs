//! Configuration for the incident service.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Default incident API URL, should not need to be changed.
pub const DEFAULT_INCIDENT_API_URL: &str = "https://app.mux.io/";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_ENABLED: &str = "INCIDENT_ENABLED";
const ENV_URL: &str = "INCIDENT_URL";
const ENV_USERNAME: &str = "INCIDENT_USERNAME";
const ENV_PASSWORD: &str = "INCIDENT_PASSWORD";
const ENV_GLOBAL: &str = "INCIDENT_GLOBAL";
const ENV_TIMEOUT_SECS: &str = "INCIDENT_TIMEOUT_SECS";

/// Incident service configuration.
///
/// Loaded once at startup and never changed afterwards.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether the integration is enabled.
    pub enabled: bool,
    /// Base URL of the incident API.
    pub url: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Whether every alert should go to this service.
    pub global: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_INCIDENT_API_URL.to_string(),
            username: String::new(),
            password: String::new(),
            global: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("global", &self.global)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Parse configuration from a TOML document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on invalid TOML or mistyped fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `INCIDENT_*` environment variables that are set.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `INCIDENT_TIMEOUT_SECS` is not a number.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var(ENV_ENABLED) {
            self.enabled = parse_flag(&v);
        }
        if let Ok(v) = std::env::var(ENV_URL) {
            self.url = v;
        }
        if let Ok(v) = std::env::var(ENV_USERNAME) {
            self.username = v;
        }
        if let Ok(v) = std::env::var(ENV_PASSWORD) {
            self.password = v;
        }
        if let Ok(v) = std::env::var(ENV_GLOBAL) {
            self.global = parse_flag(&v);
        }
        if let Ok(v) = std::env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = v.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_TIMEOUT_SECS} is not a number: {v}"))
            })?;
        }
        Ok(())
    }

    /// Check that the config can be used to build a service.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a non-HTTP URL or a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "url must start with http:// or https://, got {:?}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(v: &str) -> bool {
    v.trim().eq_ignore_ascii_case("true") || v.trim() == "1"
}
