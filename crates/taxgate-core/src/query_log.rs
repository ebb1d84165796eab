//! Query log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiKeyTier, MonthKey, TaxQuery, UpstreamOutcome};

/// One logged invocation of the tax endpoint.
///
/// Written once per request that reached the upstream call, whatever the
/// outcome. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLogEntry {
    /// When the call was logged.
    #[serde(with = "crate::timestamp::millis")]
    pub timestamp: DateTime<Utc>,

    /// Tier of the key that made the call.
    #[serde(alias = "apiKey")]
    pub api_key_type: ApiKeyTier,

    /// The normalized query.
    pub query: TaxQuery,

    /// The body returned to the caller.
    pub response: Value,

    /// The status returned to the caller.
    pub status_code: u16,
}

impl QueryLogEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn new(tier: ApiKeyTier, query: TaxQuery, outcome: &UpstreamOutcome) -> Self {
        Self::at(crate::timestamp::now(), tier, query, outcome)
    }

    /// Build an entry with an explicit timestamp.
    #[must_use]
    pub fn at(
        timestamp: DateTime<Utc>,
        tier: ApiKeyTier,
        query: TaxQuery,
        outcome: &UpstreamOutcome,
    ) -> Self {
        Self {
            timestamp,
            api_key_type: tier,
            query,
            response: outcome.body.clone(),
            status_code: outcome.status_code,
        }
    }

    /// The month this entry belongs to.
    #[must_use]
    pub fn month(&self) -> MonthKey {
        MonthKey::from_datetime(self.timestamp)
    }
}

/// All queries logged in one calendar month, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyQueryLog {
    /// The month.
    pub month: MonthKey,

    /// Logged queries, oldest first.
    #[serde(default)]
    pub queries: Vec<QueryLogEntry>,
}

impl MonthlyQueryLog {
    /// An empty log for `month`.
    #[must_use]
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            queries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: QueryLogEntry) {
        self.queries.push(entry);
    }

    /// Number of queries made with `tier`.
    #[must_use]
    pub fn count_for(&self, tier: ApiKeyTier) -> usize {
        self.queries
            .iter()
            .filter(|q| q.api_key_type == tier)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_entry(tier: ApiKeyTier) -> QueryLogEntry {
        let query = TaxQuery::new("US", Some("48201".into()), None, None);
        let outcome = UpstreamOutcome::new(200, json!({ "rate": { "combined_rate": "0.06" } }));
        QueryLogEntry::new(tier, query, &outcome)
    }

    #[test]
    fn entry_uses_camel_case_fields() {
        let value = serde_json::to_value(sample_entry(ApiKeyTier::Prod)).unwrap();
        assert_eq!(value["apiKeyType"], "prod");
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["response"]["rate"]["combined_rate"], "0.06");
    }

    #[test]
    fn reads_legacy_api_key_field() {
        let raw = json!({
            "timestamp": "2025-01-15T10:00:00.000Z",
            "apiKey": "test",
            "query": { "street": "", "city": "", "zip": "48201", "country": "US" },
            "response": { "error": "Not found" },
            "statusCode": 404
        });
        let entry: QueryLogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.api_key_type, ApiKeyTier::Test);
        assert_eq!(entry.month().as_str(), "2025-01");
    }

    #[test]
    fn monthly_log_round_trips() {
        let mut log = MonthlyQueryLog::empty("2025-02".parse().unwrap());
        log.push(sample_entry(ApiKeyTier::Test));
        log.push(sample_entry(ApiKeyTier::Prod));

        let bytes = serde_json::to_vec_pretty(&log).unwrap();
        let back: MonthlyQueryLog = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, log);
        assert_eq!(back.count_for(ApiKeyTier::Prod), 1);
    }
}
