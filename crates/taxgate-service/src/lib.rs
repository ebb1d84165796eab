//! Tax Gate HTTP service.
//!
//! An authenticated proxy in front of a public tax-rate calculator:
//!
//! - API key tiers (test and prod) on the `x-api-key` header
//! - Upstream lookups with a bounded timeout and no retries
//! - A monthly query log of every authorized call
//! - A monthly cost ledger of billable prod calls
//! - Slack notifications with the month's running totals
//! - An admin dashboard, documentation pages and permissive CORS
//!
//! # Billing
//!
//! Only prod-key calls whose upstream answer carries a defined
//! `rate.combined_rate` are billed. Logging, billing and notification are
//! side effects: their failures are logged and never change the response.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Static pages are async handlers too

pub mod auth;
pub mod config;
pub mod crypto;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod slack;
pub mod state;
pub mod upstream;

pub use config::{ConfigError, ServiceConfig, StorageConfig};
pub use error::ApiError;
pub use pipeline::{Billing, ProcessedCall, TaxPipeline};
pub use routes::create_router;
pub use slack::{NotifyError, SlackNotifier};
pub use state::AppState;
pub use upstream::{TaxClient, UpstreamError};
