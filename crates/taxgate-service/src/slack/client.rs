//! Slack incoming-webhook client.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use taxgate_core::TaxQuery;

use super::message::build_message;

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The request could not be sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with a non-2xx status.
    #[error("Slack webhook returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// Posts billing notifications to a Slack webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    /// Create a notifier. With no webhook every notification is a no-op;
    /// the missing webhook is reported once among the configuration warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        let webhook_url = webhook_url.filter(|url| !url.trim().is_empty());

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Whether a webhook is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Announce billable call number `invocation` with the month's running
    /// `total_cost`. One attempt, no retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook is unreachable or rejects the message.
    pub async fn notify(
        &self,
        query: &TaxQuery,
        invocation: u64,
        total_cost: f64,
    ) -> Result<(), NotifyError> {
        let Some(url) = &self.webhook_url else {
            return Ok(());
        };

        let message = build_message(query, invocation, total_cost, Utc::now());
        let response = self.client.post(url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        tracing::debug!(invocation, "Slack notification delivered");
        Ok(())
    }
}
