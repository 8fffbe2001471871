//! Incident API dispatcher.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::IncidentError;
use crate::handler::AlertHandler;
use crate::key::IncidentKey;
use crate::level::AlertLevel;
use crate::payload::IncidentPayload;

/// Resolve the incident endpoint for `key` under `base`.
///
/// Exactly one `/` separates the base from the path whether or not `base`
/// already ends with one.
#[must_use]
pub fn incident_url(base: &str, key: &IncidentKey) -> String {
    let mut url = base.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(&key.incident_path());
    url
}

/// A decoded and built incident, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRequest {
    pub url: String,
    pub payload: IncidentPayload,
}

/// Error body the incident API may return on rejection.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Sends alert events to the incident API.
#[derive(Debug, Clone)]
pub struct IncidentService {
    client: Client,
    config: Config,
}

impl IncidentService {
    /// Create a service with an HTTP client using the configured timeout.
    ///
    /// # Errors
    /// Returns [`IncidentError::Config`] if the config fails
    /// [`Config::validate`], or an error if the HTTP client cannot be created.
    pub fn new(config: Config) -> Result<Self, IncidentError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(config, client))
    }

    /// Create a service around an existing HTTP client.
    ///
    /// The config is used as given; the client's own timeout applies.
    #[must_use]
    pub fn with_client(config: Config, client: Client) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode the key, build the payload and resolve the destination URL.
    ///
    /// # Errors
    /// Returns [`IncidentError::MalformedIncidentKey`] or
    /// [`IncidentError::UnsupportedLevel`].
    pub fn prepare(
        &self,
        incident_key: &str,
        level: AlertLevel,
        at: DateTime<Utc>,
    ) -> Result<IncidentRequest, IncidentError> {
        let key = IncidentKey::decode(incident_key)?;
        let payload = IncidentPayload::build(&key, level, at)?;

        Ok(IncidentRequest {
            url: incident_url(&self.config.url, &key),
            payload,
        })
    }

    /// POST a prepared incident and interpret the response.
    async fn send(&self, request: &IncidentRequest) -> Result<(), IncidentError> {
        let body = request.payload.to_json()?;

        debug!(url = %request.url, "POST incident");

        let response = self
            .client
            .post(&request.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            debug!(url = %request.url, "Incident accepted");
            return Ok(());
        }

        let text = response.text().await?;

        warn!(
            status = %status,
            body = %text,
            "Incident API request failed"
        );

        Err(IncidentError::RemoteRejected {
            status: status.as_u16(),
            message: rejection_message(status, &text),
        })
    }
}

/// Pull `message` out of an error body, or describe the raw response.
fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| {
            format!(
                "failed to understand incident API response. code: {} content: {body}",
                status.as_u16()
            )
        },
        |r| r.message,
    )
}

#[async_trait]
impl AlertHandler for IncidentService {
    fn name(&self) -> &'static str {
        "incident"
    }

    fn global(&self) -> bool {
        self.config.global
    }

    fn open(&self) -> Result<(), IncidentError> {
        info!(url = %self.config.url, global = self.config.global, "Incident service opened");
        Ok(())
    }

    fn close(&self) -> Result<(), IncidentError> {
        info!("Incident service closed");
        Ok(())
    }

    async fn alert(
        &self,
        incident_key: &str,
        level: AlertLevel,
        at: DateTime<Utc>,
    ) -> Result<(), IncidentError> {
        if !self.config.enabled {
            debug!(incident_key, "Incident service disabled, skipping alert");
            return Err(IncidentError::Disabled);
        }

        let request = self.prepare(incident_key, level, at)?;
        self.send(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> IncidentKey {
        IncidentKey::decode("properties/4/alerts/38/breakdown/country=US,").unwrap()
    }

    #[test]
    fn test_incident_url_without_trailing_slash() {
        assert_eq!(
            incident_url("http://example.com", &key()),
            "http://example.com/internal-api/v1/properties/4/alerts/38/incident"
        );
    }

    #[test]
    fn test_incident_url_with_trailing_slash() {
        assert_eq!(
            incident_url("http://example.com/", &key()),
            "http://example.com/internal-api/v1/properties/4/alerts/38/incident"
        );
    }

    #[test]
    fn test_prepare_malformed_key() {
        let service = IncidentService::with_client(Config::default(), Client::new());
        let err = service
            .prepare("foobar", AlertLevel::Warning, Utc::now())
            .unwrap_err();
        assert!(matches!(err, IncidentError::MalformedIncidentKey(_)));
    }

    #[test]
    fn test_prepare_uses_configured_url() {
        let config = Config {
            url: "http://example.com".to_string(),
            ..Config::default()
        };
        let service = IncidentService::with_client(config, Client::new());
        let request = service
            .prepare(
                "properties/4/alerts/38/breakdown/country=US,",
                AlertLevel::Critical,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(
            request.url,
            "http://example.com/internal-api/v1/properties/4/alerts/38/incident"
        );
    }

    #[test]
    fn test_rejection_message_from_body() {
        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, r#"{"message":"unknown alert"}"#),
            "unknown alert"
        );
    }

    #[test]
    fn test_rejection_message_fallback() {
        assert_eq!(
            rejection_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "failed to understand incident API response. code: 502 content: <html>oops</html>"
        );
        assert_eq!(
            rejection_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"x"}"#),
            r#"failed to understand incident API response. code: 500 content: {"error":"x"}"#
        );
    }

    #[test]
    fn test_new_validates_config() {
        let err = IncidentService::new(Config {
            url: "app.mux.io".to_string(),
            ..Config::default()
        })
        .unwrap_err();
        assert!(matches!(err, IncidentError::Config(_)));

        assert!(IncidentService::new(Config::default()).is_ok());
    }

    #[test]
    fn test_global_flag() {
        let config = Config {
            global: true,
            ..Config::default()
        };
        let service = IncidentService::with_client(config, Client::new());
        assert!(service.global());
        assert_eq!(service.name(), "incident");
        assert!(service.open().is_ok());
        assert!(service.close().is_ok());
    }
}
