//! Error types for the incident adapter.

use thiserror::Error;

use crate::level::AlertLevel;

/// Errors that can occur when turning an alert into an incident call.
#[derive(Debug, Error)]
pub enum IncidentError {
    /// Incident key did not have the expected shape
    #[error("Incident key did not match regular-expression pattern: key = {0}")]
    MalformedIncidentKey(String),

    /// The destination has no representation for this level
    #[error("AlertLevel '{0}' is currently ignored by the incident service")]
    UnsupportedLevel(AlertLevel),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Non-200 response from the incident API
    #[error("{message}")]
    RemoteRejected { status: u16, message: String },

    /// The service is configured but not enabled
    #[error("Incident service is disabled")]
    Disabled,

    /// The config cannot be used to build a service
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file was not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the service cannot use
    #[error("Invalid config: {0}")]
    Invalid(String),
}
