//! Storage layer for the tax gate proxy.
//!
//! Query logs and cost ledgers are kept as one JSON blob per calendar month.
//! The blobs live behind the [`KvStore`] trait so any backend that can get,
//! put and list keys satisfies the same contract.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process map, for tests and throwaway runs
//! - [`FileStore`]: one JSON file per month under a data directory
//! - `RocksStore`: a `RocksDB` column family (feature `rocksdb-backend`)
//! - `RedisStore`: Redis strings with a retention TTL (feature `redis-backend`)
//!
//! # Concurrency
//!
//! Appends are read-modify-write cycles on a whole month. [`QueryLogStore`]
//! and [`CostLedger`] hold a per-month async lock ([`MonthLocks`]) for the
//! whole cycle, so concurrent appends to the same month never lose updates
//! within one process.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taxgate_core::CostPerCall;
//! use taxgate_store::{CostLedger, FileStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kv = Arc::new(FileStore::new("./data"));
//! let ledger = CostLedger::new(kv);
//!
//! let totals = ledger.record_billable_call(CostPerCall::new(0.5)?).await?;
//! println!("{} calls this month", totals.total_invocations);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod blob;
pub mod error;
pub mod file;
pub mod keys;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod query_log;
#[cfg(feature = "redis-backend")]
pub mod redis_store;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use ledger::CostLedger;
pub use locks::MonthLocks;
pub use memory::MemoryStore;
pub use query_log::QueryLogStore;
#[cfg(feature = "redis-backend")]
pub use redis_store::RedisStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;

/// A minimal key-value store for monthly blobs.
///
/// Implementations only need last-writer-wins puts. Serializing concurrent
/// writers to the same key is the caller's job (see [`MonthLocks`]).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// List every key starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
