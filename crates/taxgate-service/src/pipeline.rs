//! The tax lookup pipeline.
//!
//! Every authorized call runs the same sequence:
//!
//! 1. look the rate up upstream
//! 2. append the call to the query log, whatever the outcome
//! 3. for a billable prod call, record it in the cost ledger
//! 4. once the ledger write succeeded, dispatch a Slack notification with
//!    the new totals
//!
//! Steps 2-4 are side effects. Their failures are logged and never change
//! the outcome returned to the caller. The notification is delivered on a
//! background task, so the caller never waits for Slack.

use std::sync::Arc;

use taxgate_core::{ApiKeyTier, BillingTotals, CostPerCall, TaxQuery, UpstreamOutcome};
use taxgate_store::{CostLedger, QueryLogStore};

use crate::slack::SlackNotifier;
use crate::upstream::TaxClient;

/// What happened on the billing side of a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Billing {
    /// Test key or non-billable outcome; nothing recorded.
    NotBilled,
    /// Recorded in the ledger.
    Billed {
        /// Month totals after this call.
        totals: BillingTotals,
        /// Whether a notification was dispatched. Delivery happens in the
        /// background and is not reported here.
        dispatched: bool,
    },
    /// Billable, but the ledger write failed; no notification was sent.
    LedgerFailed,
}

/// Result of running one call through the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedCall {
    /// Upstream outcome, returned to the caller verbatim.
    pub outcome: UpstreamOutcome,
    /// Whether the query log append succeeded.
    pub logged: bool,
    /// Billing side effects.
    pub billing: Billing,
}

/// Runs lookups and their logging, billing and notification side effects.
pub struct TaxPipeline {
    upstream: TaxClient,
    query_log: Arc<QueryLogStore>,
    ledger: Arc<CostLedger>,
    notifier: SlackNotifier,
    cost_per_call: CostPerCall,
}

impl TaxPipeline {
    /// Assemble a pipeline.
    #[must_use]
    pub fn new(
        upstream: TaxClient,
        query_log: Arc<QueryLogStore>,
        ledger: Arc<CostLedger>,
        notifier: SlackNotifier,
        cost_per_call: CostPerCall,
    ) -> Self {
        Self {
            upstream,
            query_log,
            ledger,
            notifier,
            cost_per_call,
        }
    }

    /// Run one authorized call.
    pub async fn process(&self, tier: ApiKeyTier, query: TaxQuery) -> ProcessedCall {
        let outcome = self.upstream.lookup(&query).await;

        let logged = match self.query_log.append(tier, query.clone(), &outcome).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    tier = %tier,
                    status = outcome.status_code,
                    "Failed to append query log"
                );
                false
            }
        };

        let billing = if tier == ApiKeyTier::Prod && outcome.is_billable() {
            self.bill(&query).await
        } else {
            Billing::NotBilled
        };

        ProcessedCall {
            outcome,
            logged,
            billing,
        }
    }

    async fn bill(&self, query: &TaxQuery) -> Billing {
        let totals = match self.ledger.record_billable_call(self.cost_per_call).await {
            Ok(totals) => totals,
            Err(e) => {
                tracing::error!(error = %e, "Failed to record billable call; skipping notification");
                return Billing::LedgerFailed;
            }
        };

        tracing::info!(
            invocation = totals.total_invocations,
            total_cost = totals.total_cost,
            "Billable call recorded"
        );

        let dispatched = self.dispatch_notification(query, totals);
        Billing::Billed { totals, dispatched }
    }

    fn dispatch_notification(&self, query: &TaxQuery, totals: BillingTotals) -> bool {
        if !self.notifier.is_enabled() {
            return false;
        }

        let notifier = self.notifier.clone();
        let query = query.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier
                .notify(&query, totals.total_invocations, totals.total_cost)
                .await
            {
                tracing::warn!(
                    error = %e,
                    invocation = totals.total_invocations,
                    "Slack notification failed"
                );
            }
        });
        true
    }
}
