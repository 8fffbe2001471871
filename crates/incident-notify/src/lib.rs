//! Incident-management adapter for alert events.
//!
//! This crate turns alert events from a monitoring pipeline (incident key,
//! level, timestamp) into calls against an incident-management webhook API.
//!
//! # Usage
//!
//! ```no_run
//! use incident_notify::{AlertHandler, AlertLevel, Config, IncidentService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let service = IncidentService::new(config)?;
//!
//! service
//!     .alert(
//!         "properties/4/alerts/38/breakdown/country=US,",
//!         AlertLevel::Critical,
//!         chrono::Utc::now(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Incident keys
//!
//! Keys look like `properties/<property>/alerts/<alert>/breakdown/<pairs>`,
//! where `<pairs>` is a comma-separated list of `name=value` entries that may
//! end in one trailing comma. See [`IncidentKey`].
//!
//! # Architecture
//!
//! - [`IncidentKey`] decodes and validates the key
//! - [`IncidentPayload`] maps a key, level and time to the JSON body
//! - [`IncidentService`] resolves the URL, sends the request and interprets
//!   the response; it implements [`AlertHandler`], the pipeline-facing trait

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handler;
pub mod key;
pub mod level;
pub mod payload;
pub mod service;

pub use config::Config;
pub use error::{ConfigError, IncidentError};
pub use handler::AlertHandler;
pub use key::{Breakdown, IncidentKey};
pub use level::AlertLevel;
pub use payload::{build_incident, Incident, IncidentPayload, IncidentSeverity, IncidentStatus};
pub use service::{incident_url, IncidentRequest, IncidentService};
