//! Cost ledger records and per-call pricing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::MonthKey;

/// Tolerance used when comparing summed costs.
const COST_EPSILON: f64 = 1e-9;

/// Price charged for each billable call.
///
/// Always finite and non-negative. Zero is allowed so a missing price never
/// blocks traffic, but it is reported at startup.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CostPerCall(f64);

impl CostPerCall {
    /// A free call.
    pub const ZERO: Self = Self(0.0);

    /// Build a price, rejecting negative or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCost` for negative, NaN or infinite values.
    pub fn new(amount: f64) -> Result<Self, CoreError> {
        if amount.is_finite() && amount >= 0.0 {
            Ok(Self(amount))
        } else {
            Err(CoreError::InvalidCost(amount.to_string()))
        }
    }

    /// Resolve a configured value, falling back to zero.
    ///
    /// Returns the price and, when it fell back or is zero, a message
    /// suitable for a startup warning.
    #[must_use]
    pub fn from_config(raw: Option<&str>) -> (Self, Option<String>) {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => (
                Self::ZERO,
                Some("COST_PER_CALL not set, defaulting to 0".to_string()),
            ),
            Some(raw) => match raw.parse::<Self>() {
                Ok(cost) if cost.is_zero() => {
                    (cost, Some("COST_PER_CALL is 0, billable calls are free".to_string()))
                }
                Ok(cost) => (cost, None),
                Err(e) => (
                    Self::ZERO,
                    Some(format!("{e}: COST_PER_CALL defaulting to 0")),
                ),
            },
        }
    }

    /// The amount.
    #[must_use]
    pub fn amount(self) -> f64 {
        self.0
    }

    /// Whether calls are free.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl FromStr for CostPerCall {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount: f64 = s
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidCost(s.to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<f64> for CostPerCall {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CostPerCall> for f64 {
    fn from(value: CostPerCall) -> Self {
        value.0
    }
}

impl fmt::Display for CostPerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One billed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLogEntry {
    /// When the call was billed.
    #[serde(with = "crate::timestamp::millis")]
    pub timestamp: DateTime<Utc>,

    /// Amount charged.
    pub cost: f64,
}

/// Running totals after a ledger update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingTotals {
    /// Billed calls this month, including the one just recorded.
    pub total_invocations: u64,

    /// Cost this month, including the call just recorded.
    pub total_cost: f64,
}

/// The cost ledger for one calendar month.
///
/// `total_invocations == invocations.len()` and `total_cost` is the sum of
/// the invocation costs. [`MonthlyCostLog::record`] is the only mutator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCostLog {
    /// The month.
    pub month: MonthKey,

    /// Number of billed calls.
    pub total_invocations: u64,

    /// Sum of billed costs.
    pub total_cost: f64,

    /// Billed calls, oldest first.
    #[serde(default)]
    pub invocations: Vec<CostLogEntry>,
}

impl MonthlyCostLog {
    /// An empty ledger for `month`.
    #[must_use]
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            total_invocations: 0,
            total_cost: 0.0,
            invocations: Vec::new(),
        }
    }

    /// Record one billed call and return the updated totals.
    pub fn record(&mut self, timestamp: DateTime<Utc>, cost: CostPerCall) -> BillingTotals {
        self.invocations.push(CostLogEntry {
            timestamp,
            cost: cost.amount(),
        });
        self.total_invocations += 1;
        self.total_cost += cost.amount();
        self.totals()
    }

    /// Current totals.
    #[must_use]
    pub fn totals(&self) -> BillingTotals {
        BillingTotals {
            total_invocations: self.total_invocations,
            total_cost: self.total_cost,
        }
    }

    /// Whether the counters agree with the invocation list.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let summed: f64 = self.invocations.iter().map(|i| i.cost).sum();
        self.total_invocations == self.invocations.len() as u64
            && (self.total_cost - summed).abs() <= COST_EPSILON.max(summed.abs() * COST_EPSILON)
    }
}
