//! Alert levels as reported by the alerting pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of an alert event.
///
/// `Ok` marks a recovered condition and closes the incident on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Condition recovered
    #[serde(alias = "resolved")]
    Ok,
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Critical - immediate action required
    Critical,
}

impl AlertLevel {
    /// Get the lowercase name for this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an alert level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown alert level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for AlertLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "resolved" => Ok(Self::Ok),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "critical" | "crit" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
