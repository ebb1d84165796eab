//! Common test utilities for tax gate integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taxgate_core::{CostPerCall, MonthKey, MonthlyCostLog, MonthlyQueryLog};
use taxgate_service::{create_router, AppState, ServiceConfig, StorageConfig};
use taxgate_store::{CostLedger, KvStore, MemoryStore, QueryLogStore};

pub const TEST_KEY: &str = "test-key-123";
pub const PROD_KEY: &str = "prod-key-456";
pub const COST_PER_CALL: f64 = 0.5;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Stand-in for the upstream tax API, mounted at `/calculator`.
    pub upstream: MockServer,
    /// Stand-in for the Slack webhook, mounted at `/hook`.
    pub slack: MockServer,
    /// The store behind the service, for inspecting logs and ledgers.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a harness with the default test configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a harness, letting the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let upstream = MockServer::start().await;
        let slack = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            test_api_key: Some(TEST_KEY.into()),
            prod_api_key: Some(PROD_KEY.into()),
            cost_per_call: CostPerCall::new(COST_PER_CALL).unwrap(),
            tax_api_url: format!("{}/calculator", upstream.uri()),
            upstream_timeout_seconds: 5,
            slack_webhook_url: Some(format!("{}/hook", slack.uri())),
            notify_timeout_seconds: 5,
            storage: StorageConfig::Memory,
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../../static").into(),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let kv: Arc<dyn KvStore> = store.clone();
        let state = AppState::new(kv, config).expect("Failed to build app state");
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            upstream,
            slack,
            store,
        }
    }

    /// Make the upstream answer every lookup with `status` and `body`.
    pub async fn upstream_responds(&self, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path("/calculator"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    /// Make the upstream answer every lookup with a billable rate.
    pub async fn upstream_billable(&self) {
        self.upstream_responds(200, detroit_rate()).await;
    }

    /// Make the Slack webhook accept every message.
    pub async fn slack_accepts(&self) {
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&self.slack)
            .await;
    }

    /// `GET /?zip=48201&country=US` with `key`.
    pub fn lookup(&self, key: &str) -> TestRequest {
        self.server
            .get("/")
            .add_query_param("zip", "48201")
            .add_query_param("country", "US")
            .add_header(
                HeaderName::from_static("x-api-key"),
                HeaderValue::from_str(key).unwrap(),
            )
    }

    /// Requests the upstream received.
    pub async fn upstream_calls(&self) -> usize {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }

    /// Messages the Slack webhook received.
    pub async fn slack_calls(&self) -> usize {
        self.slack.received_requests().await.unwrap_or_default().len()
    }

    /// Wait until `expected` Slack messages arrived, giving up after a few
    /// seconds. Notifications are delivered in the background.
    pub async fn wait_for_slack_calls(&self, expected: usize) -> usize {
        for _ in 0..100 {
            let calls = self.slack_calls().await;
            if calls >= expected {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.slack_calls().await
    }

    /// This month's query log.
    pub async fn query_log(&self) -> MonthlyQueryLog {
        QueryLogStore::new(self.store.clone())
            .get(&MonthKey::current())
            .await
            .unwrap()
    }

    /// This month's cost ledger.
    pub async fn ledger(&self) -> MonthlyCostLog {
        CostLedger::new(self.store.clone())
            .current_month_stats()
            .await
            .unwrap()
    }
}

/// A complete upstream answer for Detroit.
pub fn detroit_rate() -> Value {
    json!({
        "rate": {
            "state": "MI",
            "zip": "48201",
            "city": "DETROIT",
            "country": "US",
            "combined_rate": "0.06",
            "state_rate": "0.06"
        }
    })
}
