//! Monthly query logs.

use std::sync::Arc;

use taxgate_core::{
    ApiKeyTier, MonthKey, MonthlyQueryLog, QueryLogEntry, TaxQuery, UpstreamOutcome,
};

use crate::error::Result;
use crate::locks::MonthLocks;
use crate::{blob, keys, KvStore};

/// Append-only log of every tax query, partitioned by UTC month.
pub struct QueryLogStore {
    kv: Arc<dyn KvStore>,
    locks: MonthLocks,
}

impl QueryLogStore {
    /// Create a log store over `kv`.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            locks: MonthLocks::new(),
        }
    }

    /// Log one query in the current month.
    ///
    /// Returns the entry that was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read, decoded or written.
    pub async fn append(
        &self,
        tier: ApiKeyTier,
        query: TaxQuery,
        outcome: &UpstreamOutcome,
    ) -> Result<QueryLogEntry> {
        let entry = QueryLogEntry::new(tier, query, outcome);
        self.append_at(&entry.month(), entry.clone()).await?;
        Ok(entry)
    }

    /// Append `entry` to the log of `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read, decoded or written.
    pub async fn append_at(&self, month: &MonthKey, entry: QueryLogEntry) -> Result<usize> {
        let key = keys::month_key(keys::QUERY_LOGS, month);
        let _guard = self.locks.lock(&key).await;

        let mut log = blob::load::<MonthlyQueryLog>(self.kv.as_ref(), &key)
            .await?
            .unwrap_or_else(|| MonthlyQueryLog::empty(month.clone()));
        log.push(entry);
        blob::save(self.kv.as_ref(), &key, &log).await?;

        tracing::debug!(month = %month, queries = log.queries.len(), "Query logged");
        Ok(log.queries.len())
    }

    /// The log of `month`, empty if nothing was logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read or decoded.
    pub async fn get(&self, month: &MonthKey) -> Result<MonthlyQueryLog> {
        let key = keys::month_key(keys::QUERY_LOGS, month);
        Ok(blob::load(self.kv.as_ref(), &key)
            .await?
            .unwrap_or_else(|| MonthlyQueryLog::empty(month.clone())))
    }

    /// Every monthly log, newest month first.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or any blob cannot be decoded.
    pub async fn list_all(&self) -> Result<Vec<MonthlyQueryLog>> {
        let all = blob::load_all::<MonthlyQueryLog>(self.kv.as_ref(), keys::QUERY_LOGS).await?;
        Ok(all.into_iter().map(|(_, log)| log).collect())
    }
}
