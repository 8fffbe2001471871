//! Incident key decoding.
//!
//! The alerting pipeline identifies an incident with a path-like key:
//!
//! ```text
//! properties/<property_id>/alerts/<alert_id>/breakdown/<name>=<value>,<name>=<value>,
//! ```
//!
//! The breakdown list may end with a single trailing comma. Property and alert
//! ids each map to exactly one URL path segment, so they may not contain `/`,
//! `?` or `#` and may not be `.` or `..`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::IncidentError;

/// Separator between breakdown dimensions.
const BREAKDOWN_SEPARATOR: char = ',';

/// Separator between a dimension name and its value.
const NAME_VALUE_SEPARATOR: char = '=';

static INCIDENT_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^properties/([^/?#]+)/alerts/([^/?#]+)/breakdown/(.+)$").unwrap()
});

/// Ids that a URL parser would resolve as dot segments.
fn is_dot_segment(id: &str) -> bool {
    id == "." || id == ".."
}

/// A single dimension/value pair, e.g. `country=US`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub name: String,
    pub value: String,
}

impl Breakdown {
    /// Split one breakdown entry on its first `=`.
    ///
    /// An entry without `=` keeps the whole text as its name and an empty value.
    fn parse(entry: &str) -> Self {
        let (name, value) = entry
            .split_once(NAME_VALUE_SEPARATOR)
            .unwrap_or((entry, ""));
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Structural parts of an incident key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentKey {
    property_id: String,
    alert_id: String,
    breakdown_key: String,
    breakdowns: Vec<Breakdown>,
}

impl IncidentKey {
    /// Decode a raw incident key.
    ///
    /// Exactly one trailing `,` is stripped from the breakdown list. A key
    /// ending in `,,` therefore keeps a trailing `,` in `breakdown_key` and
    /// gains an empty `{name: "", value: ""}` breakdown; entries are passed
    /// through without validation.
    ///
    /// # Errors
    /// Returns [`IncidentError::MalformedIncidentKey`] carrying `raw` when the
    /// key does not have the `properties/../alerts/../breakdown/..` shape or
    /// an id is not a single path segment.
    pub fn decode(raw: &str) -> Result<Self, IncidentError> {
        let malformed = || IncidentError::MalformedIncidentKey(raw.to_string());

        let caps = INCIDENT_KEY_PATTERN.captures(raw).ok_or_else(malformed)?;

        if is_dot_segment(&caps[1]) || is_dot_segment(&caps[2]) {
            return Err(malformed());
        }

        let raw_breakdowns = &caps[3];
        let breakdown_key = raw_breakdowns
            .strip_suffix(BREAKDOWN_SEPARATOR)
            .unwrap_or(raw_breakdowns);

        let breakdowns = if breakdown_key.is_empty() {
            vec![]
        } else {
            breakdown_key
                .split(BREAKDOWN_SEPARATOR)
                .map(Breakdown::parse)
                .collect()
        };

        Ok(Self {
            property_id: caps[1].to_string(),
            alert_id: caps[2].to_string(),
            breakdown_key: breakdown_key.to_string(),
            breakdowns,
        })
    }

    #[must_use]
    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    #[must_use]
    pub fn alert_id(&self) -> &str {
        &self.alert_id
    }

    /// Breakdown list with one trailing separator removed.
    #[must_use]
    pub fn breakdown_key(&self) -> &str {
        &self.breakdown_key
    }

    #[must_use]
    pub fn breakdowns(&self) -> &[Breakdown] {
        &self.breakdowns
    }

    /// Path of the incident resource, relative to the API base URL.
    #[must_use]
    pub fn incident_path(&self) -> String {
        format!(
            "internal-api/v1/properties/{}/alerts/{}/incident",
            self.property_id, self.alert_id
        )
    }
}

impl FromStr for IncidentKey {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
