//! Inbound contract for alert destinations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::IncidentError;
use crate::level::AlertLevel;

/// A destination the alerting pipeline hands alert events to.
#[async_trait]
pub trait AlertHandler: Send + Sync {
    /// Get the name of this destination.
    fn name(&self) -> &'static str;

    /// Whether this destination receives every alert regardless of routing.
    fn global(&self) -> bool;

    /// Lifecycle hook called before the first alert.
    fn open(&self) -> Result<(), IncidentError> {
        Ok(())
    }

    /// Lifecycle hook called on shutdown.
    fn close(&self) -> Result<(), IncidentError> {
        Ok(())
    }

    /// Deliver one alert event.
    async fn alert(
        &self,
        incident_key: &str,
        level: AlertLevel,
        at: DateTime<Utc>,
    ) -> Result<(), IncidentError>;
}
