//! Upstream tax API client implementation.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;

use taxgate_core::{TaxQuery, UpstreamOutcome};

/// Error type for upstream lookups.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connection, DNS or timeout failure.
    #[error("{0}")]
    Transport(String),

    /// The reply body was not JSON.
    #[error("malformed upstream body: {0}")]
    MalformedBody(#[source] serde_json::Error),
}

impl UpstreamError {
    fn from_transport(err: &reqwest::Error) -> Self {
        let description = if err.is_timeout() {
            "Upstream tax API timed out".to_string()
        } else if err.is_connect() {
            "Failed to connect to upstream tax API".to_string()
        } else {
            format!("Upstream request failed: {err}")
        };
        Self::Transport(description)
    }

    /// The outcome reported to the caller for this failure.
    #[must_use]
    pub fn into_outcome(self) -> UpstreamOutcome {
        match self {
            Self::MalformedBody(_) => UpstreamOutcome::malformed_response(),
            Self::Transport(description) => UpstreamOutcome::transport_failure(description),
        }
    }
}

/// Tax-rate lookup client.
#[derive(Debug, Clone)]
pub struct TaxClient {
    client: Client,
    base_url: String,
}

impl TaxClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The endpoint queried by this client.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up the rate for `query`, folding failures into an outcome.
    pub async fn lookup(&self, query: &TaxQuery) -> UpstreamOutcome {
        match self.try_lookup(query).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    zip = query.zip.as_deref().unwrap_or(""),
                    country = %query.country,
                    "Upstream tax lookup failed"
                );
                err.into_outcome()
            }
        }
    }

    /// Look up the rate for `query`.
    ///
    /// Any HTTP status is a success here; only transport failures and
    /// non-JSON bodies are errors.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Transport`] if the request could not be
    /// completed and [`UpstreamError::MalformedBody`] if the body is not JSON.
    pub async fn try_lookup(&self, query: &TaxQuery) -> Result<UpstreamOutcome, UpstreamError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&query.upstream_params())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::from_transport(&e))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_transport(&e))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(UpstreamError::MalformedBody)?;

        tracing::debug!(status, "Upstream tax lookup completed");

        Ok(UpstreamOutcome::new(status, body))
    }
}
