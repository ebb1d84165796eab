//! `RocksDB` storage.
//!
//! Blobs live in a single column family. `RocksDB` calls block, so every
//! operation runs on the blocking thread pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options};

use crate::error::{Result, StoreError};
use crate::KvStore;

/// Column family holding monthly blobs.
pub const BLOBS_CF: &str = "blobs";

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed `KvStore`.
pub struct RocksStore {
    db: Arc<Db>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(BLOBS_CF, Options::default())];

        let db = Db::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Db) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StoreError::Database(format!("blocking task failed: {e}")))?
    }
}

fn cf(db: &Db) -> Result<Arc<rocksdb::BoundColumnFamily<'_>>> {
    db.cf_handle(BLOBS_CF)
        .ok_or_else(|| StoreError::Database(format!("column family not found: {BLOBS_CF}")))
}

#[async_trait]
impl KvStore for RocksStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.run(move |db| {
            let cf = cf(db)?;
            db.get_cf(&cf, key.as_bytes())
                .map_err(|e| StoreError::Database(e.to_string()))
        })
        .await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let key = key.to_string();
        self.run(move |db| {
            let cf = cf(db)?;
            db.put_cf(&cf, key.as_bytes(), value)
                .map_err(|e| StoreError::Database(e.to_string()))
        })
        .await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();
        self.run(move |db| {
            let cf = cf(db)?;
            let iter = db.iterator_cf(&cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

            let mut keys = Vec::new();
            for item in iter {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if !key.starts_with(prefix.as_bytes()) {
                    break;
                }
                let key = String::from_utf8(key.to_vec())
                    .map_err(|e| StoreError::InvalidKey(e.to_string()))?;
                keys.push(key);
            }
            Ok(keys)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "rocksdb"
    }
}
