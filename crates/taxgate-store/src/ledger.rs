//! Monthly cost ledgers.

use std::sync::Arc;

use taxgate_core::{timestamp, BillingTotals, CostPerCall, MonthKey, MonthlyCostLog};

use crate::error::Result;
use crate::locks::MonthLocks;
use crate::{blob, keys, KvStore};

/// Ledger of billed calls, partitioned by UTC month.
pub struct CostLedger {
    kv: Arc<dyn KvStore>,
    locks: MonthLocks,
}

impl CostLedger {
    /// Create a ledger over `kv`.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            locks: MonthLocks::new(),
        }
    }

    /// Record one billed call in the current month.
    ///
    /// Returns the totals after the update, so callers can report them
    /// without reading the ledger again.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read, decoded or written.
    pub async fn record_billable_call(&self, cost: CostPerCall) -> Result<BillingTotals> {
        let now = timestamp::now();
        self.record_at(&MonthKey::from_datetime(now), now, cost).await
    }

    /// Record one billed call at `at` in `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read, decoded or written.
    pub async fn record_at(
        &self,
        month: &MonthKey,
        at: chrono::DateTime<chrono::Utc>,
        cost: CostPerCall,
    ) -> Result<BillingTotals> {
        let key = keys::month_key(keys::COST_LOGS, month);
        let _guard = self.locks.lock(&key).await;

        let mut ledger = blob::load::<MonthlyCostLog>(self.kv.as_ref(), &key)
            .await?
            .unwrap_or_else(|| MonthlyCostLog::empty(month.clone()));
        let totals = ledger.record(at, cost);
        blob::save(self.kv.as_ref(), &key, &ledger).await?;

        tracing::debug!(
            month = %month,
            total_invocations = totals.total_invocations,
            total_cost = totals.total_cost,
            "Billable call recorded"
        );
        Ok(totals)
    }

    /// The ledger of the current month.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read or decoded.
    pub async fn current_month_stats(&self) -> Result<MonthlyCostLog> {
        self.get(&MonthKey::current()).await
    }

    /// The ledger of `month`, empty if nothing was billed.
    ///
    /// # Errors
    ///
    /// Returns an error if the month blob cannot be read or decoded.
    pub async fn get(&self, month: &MonthKey) -> Result<MonthlyCostLog> {
        let key = keys::month_key(keys::COST_LOGS, month);
        Ok(blob::load(self.kv.as_ref(), &key)
            .await?
            .unwrap_or_else(|| MonthlyCostLog::empty(month.clone())))
    }

    /// Every monthly ledger, newest month first.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or any blob cannot be decoded.
    pub async fn list_all(&self) -> Result<Vec<MonthlyCostLog>> {
        let all = blob::load_all::<MonthlyCostLog>(self.kv.as_ref(), keys::COST_LOGS).await?;
        Ok(all.into_iter().map(|(_, ledger)| ledger).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn price(amount: f64) -> CostPerCall {
        CostPerCall::new(amount).unwrap()
    }

    #[tokio::test]
    async fn record_returns_post_update_totals() {
        let ledger = CostLedger::new(Arc::new(MemoryStore::new()));

        let first = ledger.record_billable_call(price(0.5)).await.unwrap();
        let second = ledger.record_billable_call(price(0.5)).await.unwrap();

        assert_eq!(first.total_invocations, 1);
        assert_eq!(second.total_invocations, 2);
        assert!((second.total_cost - 1.0).abs() < 1e-9);

        let stats = ledger.current_month_stats().await.unwrap();
        assert_eq!(stats.totals(), second);
        assert!(stats.is_consistent());
    }

    #[tokio::test]
    async fn zero_price_still_counts_invocations() {
        let ledger = CostLedger::new(Arc::new(MemoryStore::new()));
        let totals = ledger.record_billable_call(CostPerCall::ZERO).await.unwrap();
        assert_eq!(totals.total_invocations, 1);
        assert!(totals.total_cost.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn months_are_independent() {
        let ledger = CostLedger::new(Arc::new(MemoryStore::new()));
        let jan: MonthKey = "2025-01".parse().unwrap();
        let feb: MonthKey = "2025-02".parse().unwrap();
        let at = timestamp::now();

        ledger.record_at(&jan, at, price(1.0)).await.unwrap();
        ledger.record_at(&jan, at, price(1.0)).await.unwrap();
        let feb_totals = ledger.record_at(&feb, at, price(1.0)).await.unwrap();

        assert_eq!(feb_totals.total_invocations, 1);
        let all = ledger.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].month, feb);
        assert_eq!(all[1].total_invocations, 2);
    }

    #[tokio::test]
    async fn file_backend_round_trips() {
        let dir = TempDir::new().unwrap();
        let month: MonthKey = "2025-06".parse().unwrap();

        let written = {
            let ledger = CostLedger::new(Arc::new(FileStore::new(dir.path())));
            ledger.record_at(&month, timestamp::now(), price(0.1)).await.unwrap();
            ledger.record_at(&month, timestamp::now(), price(0.2)).await.unwrap();
            ledger.get(&month).await.unwrap()
        };

        let reopened = CostLedger::new(Arc::new(FileStore::new(dir.path())));
        let read_back = reopened.get(&month).await.unwrap();
        assert_eq!(read_back, written);
        assert!(read_back.is_consistent());
    }

    #[tokio::test]
    async fn concurrent_billable_calls_are_all_counted() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(CostLedger::new(Arc::new(FileStore::new(dir.path()))));
        let n = 50;

        let tasks = (0..n).map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.record_billable_call(price(0.5)).await })
        });
        let mut seen: Vec<u64> = Vec::new();
        for handle in futures::future::join_all(tasks).await {
            seen.push(handle.unwrap().unwrap().total_invocations);
        }

        let stats = ledger.current_month_stats().await.unwrap();
        assert_eq!(stats.total_invocations, n);
        assert_eq!(stats.invocations.len(), 50);
        assert!(stats.is_consistent());

        // Each caller saw a distinct running count.
        seen.sort_unstable();
        assert_eq!(seen, (1..=n).collect::<Vec<_>>());
    }
}
