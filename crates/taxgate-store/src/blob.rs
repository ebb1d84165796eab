//! JSON encoding of monthly blobs.

use serde::de::DeserializeOwned;
use serde::Serialize;

use taxgate_core::MonthKey;

use crate::error::{Result, StoreError};
use crate::{keys, KvStore};

/// Load and decode the blob under `key`.
pub(crate) async fn load<T: DeserializeOwned>(kv: &dyn KvStore, key: &str) -> Result<Option<T>> {
    kv.get(key)
        .await?
        .map(|data| serde_json::from_slice(&data).map_err(Into::into))
        .transpose()
}

/// Encode and store `value` under `key`.
pub(crate) async fn save<T: Serialize>(kv: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    kv.put(key, data).await
}

/// Load every month in `namespace`, newest first.
///
/// Keys that do not carry a valid month and blobs that fail to decode are
/// skipped with a warning. Backend failures abort the listing.
pub(crate) async fn load_all<T: DeserializeOwned>(
    kv: &dyn KvStore,
    namespace: &str,
) -> Result<Vec<(MonthKey, T)>> {
    let prefix = keys::namespace_prefix(namespace);
    let mut months: Vec<(MonthKey, String)> = Vec::new();

    for key in kv.list_keys(&prefix).await? {
        match keys::month_of(namespace, &key) {
            Some(month) => months.push((month, key)),
            None => tracing::warn!(key = %key, "Skipping key without a month"),
        }
    }

    months.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = Vec::with_capacity(months.len());
    for (month, key) in months {
        match load(kv, &key).await {
            Ok(Some(value)) => out.push((month, value)),
            Ok(None) => {}
            Err(StoreError::Serialization(e)) => {
                tracing::warn!(key = %key, error = %e, "Skipping undecodable month");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
