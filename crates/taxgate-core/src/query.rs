//! Tax queries and upstream outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Error message synthesized when the upstream body is not JSON.
pub const INVALID_UPSTREAM_RESPONSE: &str = "Invalid response from TaxJar API";

/// Normalized inbound query parameters.
///
/// Echoed verbatim into query logs and notifications. Empty parameters are
/// stored as `None`; the upstream client sends them as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxQuery {
    /// Country code, e.g. `US`.
    #[serde(default)]
    pub country: String,

    /// ZIP or postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    /// City name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

impl TaxQuery {
    /// Build a query, turning empty optional values into `None`. Values are
    /// otherwise kept exactly as the caller sent them.
    #[must_use]
    pub fn new(
        country: impl Into<String>,
        zip: Option<String>,
        city: Option<String>,
        street: Option<String>,
    ) -> Self {
        Self {
            country: country.into(),
            zip: non_empty(zip),
            city: non_empty(city),
            street: non_empty(street),
        }
    }

    /// Query-string pairs sent upstream, absent values as empty strings.
    #[must_use]
    pub fn upstream_params(&self) -> [(&'static str, &str); 4] {
        [
            ("street", self.street.as_deref().unwrap_or("")),
            ("city", self.city.as_deref().unwrap_or("")),
            ("zip", self.zip.as_deref().unwrap_or("")),
            ("country", self.country.as_str()),
        ]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Result of one call to the upstream tax service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamOutcome {
    /// HTTP status returned to the caller.
    pub status_code: u16,

    /// Rate object or error object.
    pub body: Value,
}

impl UpstreamOutcome {
    /// Wrap a parsed upstream reply.
    #[must_use]
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Outcome for a connection, DNS or timeout failure.
    #[must_use]
    pub fn transport_failure(description: impl Into<String>) -> Self {
        Self::new(500, json!({ "error": description.into() }))
    }

    /// Outcome for a reply whose body was not JSON.
    #[must_use]
    pub fn malformed_response() -> Self {
        Self::new(500, json!({ "error": INVALID_UPSTREAM_RESPONSE }))
    }

    /// The `error` message carried by the body, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// The `rate.combined_rate` value, if defined.
    #[must_use]
    pub fn combined_rate(&self) -> Option<&Value> {
        self.body
            .get("rate")
            .filter(|rate| rate.is_object())
            .and_then(|rate| rate.get("combined_rate"))
            .filter(|value| !value.is_null())
    }

    /// Whether this outcome should be charged to a prod caller.
    ///
    /// True only for a `200` whose body has no `error` field and carries a
    /// `rate` object with a defined `combined_rate`.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.status_code == 200
            && self.body.get("error").is_none()
            && self.combined_rate().is_some()
    }
}
