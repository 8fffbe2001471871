//! Incident payload construction.
//!
//! Serialized JSON keys come out in alphabetical order: the fields of
//! [`Incident`] and [`Breakdown`] are declared alphabetically and serde
//! writes struct fields in declaration order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IncidentError;
use crate::key::{Breakdown, IncidentKey};
use crate::level::AlertLevel;

/// Incident lifecycle state on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Closed,
}

/// Severity vocabulary of the incident API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Warning,
    Alert,
}

/// Request body wrapper: `{"incident": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentPayload {
    incident: Incident,
}

/// Body of the incident object.
///
/// An open incident carries `severity` and `started_at`; a closed one carries
/// only `resolved_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    breakdown_key: String,
    breakdowns: Vec<Breakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity: Option<IncidentSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<String>,
    status: IncidentStatus,
}

impl IncidentPayload {
    /// Build the payload for a decoded key at the given level.
    ///
    /// # Errors
    /// Returns [`IncidentError::UnsupportedLevel`] for [`AlertLevel::Info`].
    pub fn build(
        key: &IncidentKey,
        level: AlertLevel,
        at: DateTime<Utc>,
    ) -> Result<Self, IncidentError> {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);

        let (status, severity, started_at, resolved_at) = match level {
            AlertLevel::Warning => (
                IncidentStatus::Open,
                Some(IncidentSeverity::Warning),
                Some(timestamp),
                None,
            ),
            AlertLevel::Critical => (
                IncidentStatus::Open,
                Some(IncidentSeverity::Alert),
                Some(timestamp),
                None,
            ),
            AlertLevel::Info => return Err(IncidentError::UnsupportedLevel(level)),
            AlertLevel::Ok => (IncidentStatus::Closed, None, None, Some(timestamp)),
        };

        Ok(Self {
            incident: Incident {
                breakdown_key: key.breakdown_key().to_string(),
                breakdowns: key.breakdowns().to_vec(),
                resolved_at,
                severity,
                started_at,
                status,
            },
        })
    }

    #[must_use]
    pub fn incident(&self) -> &Incident {
        &self.incident
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    /// Returns [`IncidentError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>, IncidentError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Incident {
    #[must_use]
    pub fn breakdown_key(&self) -> &str {
        &self.breakdown_key
    }

    #[must_use]
    pub fn breakdowns(&self) -> &[Breakdown] {
        &self.breakdowns
    }

    #[must_use]
    pub const fn status(&self) -> IncidentStatus {
        self.status
    }

    #[must_use]
    pub const fn severity(&self) -> Option<IncidentSeverity> {
        self.severity
    }

    #[must_use]
    pub fn started_at(&self) -> Option<&str> {
        self.started_at.as_deref()
    }

    #[must_use]
    pub fn resolved_at(&self) -> Option<&str> {
        self.resolved_at.as_deref()
    }
}

/// Decode `raw_key` and serialize the incident body for `level` at `at`.
///
/// # Errors
/// Returns the decode or build error; nothing is serialized in that case.
pub fn build_incident(
    raw_key: &str,
    level: AlertLevel,
    at: DateTime<Utc>,
) -> Result<Vec<u8>, IncidentError> {
    let key = IncidentKey::decode(raw_key)?;
    IncidentPayload::build(&key, level, at)?.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "properties/4/alerts/38/breakdown/country=US,";
    const DOUBLE: &str = "properties/4/alerts/38/breakdown/country=US,browser=Firefox";

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_468_072_740, 0).unwrap()
    }

    fn build_string(raw: &str, level: AlertLevel) -> String {
        String::from_utf8(build_incident(raw, level, at()).unwrap()).unwrap()
    }

    #[test]
    fn test_open_warning_single_breakdown() {
        assert_eq!(
            build_string(SINGLE, AlertLevel::Warning),
            r#"{"incident":{"breakdown_key":"country=US","breakdowns":[{"name":"country","value":"US"}],"severity":"warning","started_at":"2016-07-09T13:59:00Z","status":"open"}}"#
        );
    }

    #[test]
    fn test_open_warning_two_breakdowns() {
        assert_eq!(
            build_string(DOUBLE, AlertLevel::Warning),
            r#"{"incident":{"breakdown_key":"country=US,browser=Firefox","breakdowns":[{"name":"country","value":"US"},{"name":"browser","value":"Firefox"}],"severity":"warning","started_at":"2016-07-09T13:59:00Z","status":"open"}}"#
        );
    }

    #[test]
    fn test_open_critical_single_breakdown() {
        assert_eq!(
            build_string(SINGLE, AlertLevel::Critical),
            r#"{"incident":{"breakdown_key":"country=US","breakdowns":[{"name":"country","value":"US"}],"severity":"alert","started_at":"2016-07-09T13:59:00Z","status":"open"}}"#
        );
    }

    #[test]
    fn test_open_critical_two_breakdowns() {
        assert_eq!(
            build_string(DOUBLE, AlertLevel::Critical),
            r#"{"incident":{"breakdown_key":"country=US,browser=Firefox","breakdowns":[{"name":"country","value":"US"},{"name":"browser","value":"Firefox"}],"severity":"alert","started_at":"2016-07-09T13:59:00Z","status":"open"}}"#
        );
    }

    #[test]
    fn test_closed_single_breakdown() {
        assert_eq!(
            build_string(SINGLE, AlertLevel::Ok),
            r#"{"incident":{"breakdown_key":"country=US","breakdowns":[{"name":"country","value":"US"}],"resolved_at":"2016-07-09T13:59:00Z","status":"closed"}}"#
        );
    }

    #[test]
    fn test_closed_two_breakdowns() {
        assert_eq!(
            build_string(DOUBLE, AlertLevel::Ok),
            r#"{"incident":{"breakdown_key":"country=US,browser=Firefox","breakdowns":[{"name":"country","value":"US"},{"name":"browser","value":"Firefox"}],"resolved_at":"2016-07-09T13:59:00Z","status":"closed"}}"#
        );
    }

    #[test]
    fn test_info_is_rejected() {
        let key = IncidentKey::decode(SINGLE).unwrap();
        let err = IncidentPayload::build(&key, AlertLevel::Info, at()).unwrap_err();
        assert!(matches!(err, IncidentError::UnsupportedLevel(AlertLevel::Info)));
    }

    #[test]
    fn test_malformed_key_is_rejected() {
        let err = build_incident("foobar", AlertLevel::Warning, at()).unwrap_err();
        assert!(matches!(err, IncidentError::MalformedIncidentKey(ref k) if k == "foobar"));
    }

    #[test]
    fn test_field_presence_by_status() {
        let key = IncidentKey::decode(DOUBLE).unwrap();

        let open = IncidentPayload::build(&key, AlertLevel::Critical, at()).unwrap();
        assert_eq!(open.incident().status(), IncidentStatus::Open);
        assert_eq!(open.incident().severity(), Some(IncidentSeverity::Alert));
        assert_eq!(open.incident().started_at(), Some("2016-07-09T13:59:00Z"));
        assert_eq!(open.incident().resolved_at(), None);

        let closed = IncidentPayload::build(&key, AlertLevel::Ok, at()).unwrap();
        assert_eq!(closed.incident().status(), IncidentStatus::Closed);
        assert_eq!(closed.incident().severity(), None);
        assert_eq!(closed.incident().started_at(), None);
        assert_eq!(closed.incident().resolved_at(), Some("2016-07-09T13:59:00Z"));
    }

    #[test]
    fn test_breakdowns_survive_serialization() {
        let key = IncidentKey::decode(
            "properties/9/alerts/1/breakdown/country=US,browser=Firefox,os=Linux,",
        )
        .unwrap();
        let json = IncidentPayload::build(&key, AlertLevel::Warning, at())
            .unwrap()
            .to_json()
            .unwrap();

        let decoded: IncidentPayload = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded.incident().breakdown_key(), key.breakdown_key());
        assert_eq!(decoded.incident().breakdowns(), key.breakdowns());

        let rebuilt = IncidentKey::decode(&format!(
            "properties/9/alerts/1/breakdown/{}",
            decoded.incident().breakdown_key()
        ))
        .unwrap();
        assert_eq!(rebuilt.breakdowns(), key.breakdowns());
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = build_incident(DOUBLE, AlertLevel::Warning, at()).unwrap();
        let second = build_incident(DOUBLE, AlertLevel::Warning, at()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sub_second_precision_is_dropped() {
        let at = DateTime::from_timestamp(1_468_072_740, 250_000_000).unwrap();
        let key = IncidentKey::decode(SINGLE).unwrap();
        let payload = IncidentPayload::build(&key, AlertLevel::Warning, at).unwrap();
        assert_eq!(payload.incident().started_at(), Some("2016-07-09T13:59:00Z"));
    }
}
