//! Client for the upstream tax-rate service.
//!
//! One GET per lookup, no retries. Failures never escape as errors: they are
//! folded into a synthesized `500` [`UpstreamOutcome`](taxgate_core::UpstreamOutcome)
//! that is never billable.

pub mod client;

pub use client::{TaxClient, UpstreamError};
