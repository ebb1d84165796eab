//! Application state.

use std::sync::Arc;
use std::time::Duration;

use taxgate_store::{CostLedger, KvStore, QueryLogStore};

use crate::auth::{AdminSessions, ApiKeyValidator};
use crate::config::{ConfigError, ServiceConfig};
use crate::pipeline::TaxPipeline;
use crate::slack::SlackNotifier;
use crate::upstream::TaxClient;

/// Application state shared across handlers.
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// API key classification.
    pub keys: ApiKeyValidator,

    /// Admin login and session cookies.
    pub admin: AdminSessions,

    /// Monthly query logs.
    pub query_log: Arc<QueryLogStore>,

    /// Monthly cost ledgers.
    pub ledger: Arc<CostLedger>,

    /// Lookup, logging and billing.
    pub pipeline: TaxPipeline,
}

impl AppState {
    /// Wire the stores and clients for `config` over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(store: Arc<dyn KvStore>, config: ServiceConfig) -> Result<Self, ConfigError> {
        tracing::info!(backend = store.backend_name(), "Storage backend ready");

        let query_log = Arc::new(QueryLogStore::new(store.clone()));
        let ledger = Arc::new(CostLedger::new(store));

        let upstream = TaxClient::new(
            &config.tax_api_url,
            Duration::from_secs(config.upstream_timeout_seconds),
        )?;
        let notifier = SlackNotifier::new(
            config.slack_webhook_url.clone(),
            Duration::from_secs(config.notify_timeout_seconds),
        )?;

        let pipeline = TaxPipeline::new(
            upstream,
            query_log.clone(),
            ledger.clone(),
            notifier,
            config.cost_per_call,
        );

        let keys = ApiKeyValidator::new(config.test_api_key.clone(), config.prod_api_key.clone());
        let admin = AdminSessions::new(
            config.test_api_key.clone(),
            config.admin_session_secret.clone(),
        );

        Ok(Self {
            config,
            keys,
            admin,
            query_log,
            ledger,
            pipeline,
        })
    }
}
