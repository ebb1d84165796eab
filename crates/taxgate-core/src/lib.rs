//! Core types for the tax gate proxy.
//!
//! This crate holds the vocabulary shared by the store and the HTTP service:
//!
//! - **Queries**: `TaxQuery`, `UpstreamOutcome` and the billing predicate
//! - **Keys**: `ApiKeyTier`, `ApiKeyClass`
//! - **Months**: `MonthKey`, the `YYYY-MM` partition of every ledger
//! - **Query logs**: `QueryLogEntry`, `MonthlyQueryLog`
//! - **Costs**: `CostPerCall`, `CostLogEntry`, `MonthlyCostLog`, `BillingTotals`
//!
//! # Billing rule
//!
//! A call is billed only when it was made with the prod key and the upstream
//! answered `200` with a body carrying `rate.combined_rate` and no `error`.
//! Everything else is logged but free.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cost;
pub mod error;
pub mod month;
pub mod query;
pub mod query_log;
pub mod tier;
pub mod timestamp;

pub use cost::{BillingTotals, CostLogEntry, CostPerCall, MonthlyCostLog};
pub use error::{CoreError, Result};
pub use month::MonthKey;
pub use query::{TaxQuery, UpstreamOutcome, INVALID_UPSTREAM_RESPONSE};
pub use query_log::{MonthlyQueryLog, QueryLogEntry};
pub use tier::{ApiKeyClass, ApiKeyTier};
