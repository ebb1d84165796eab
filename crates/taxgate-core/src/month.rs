//! Month keys.
//!
//! Every ledger is partitioned by calendar month in UTC. The key is the
//! zero-padded `YYYY-MM` string, so lexicographic order is chronological.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(String);

impl MonthKey {
    /// The month containing `at`.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(format!("{:04}-{:02}", at.year(), at.month()))
    }

    /// The current UTC month.
    #[must_use]
    pub fn current() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MonthKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidMonth(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let month_num: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month_num) {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_datetime_zero_pads() {
        let at = DateTime::parse_from_rfc3339("2025-03-31T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(MonthKey::from_datetime(at).as_str(), "2025-03");
    }

    #[test]
    fn parse_accepts_valid_months() {
        assert!("2024-01".parse::<MonthKey>().is_ok());
        assert!("2024-12".parse::<MonthKey>().is_ok());
    }

    #[test]
    fn parse_rejects_malformed_months() {
        for bad in ["2024-13", "2024-00", "2024-1", "24-01", "2024/01", "abcd-ef", ""] {
            assert!(bad.parse::<MonthKey>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let mut months: Vec<MonthKey> = ["2025-01", "2024-12", "2025-10", "2025-02"]
            .iter()
            .map(|m| m.parse().unwrap())
            .collect();
        months.sort();
        let sorted: Vec<&str> = months.iter().map(MonthKey::as_str).collect();
        assert_eq!(sorted, ["2024-12", "2025-01", "2025-02", "2025-10"]);
    }

    #[test]
    fn deserialize_validates() {
        let ok: MonthKey = serde_json::from_str("\"2025-07\"").unwrap();
        assert_eq!(ok.as_str(), "2025-07");
        assert!(serde_json::from_str::<MonthKey>("\"2025-7\"").is_err());
    }
}
