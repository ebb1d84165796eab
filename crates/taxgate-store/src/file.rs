//! Filesystem storage.
//!
//! Each key `<namespace>:<name>` maps to `<root>/<namespace>/<name>.json`,
//! which keeps the data directory readable by hand (`data/logs/2025-03.json`).
//! Writes go through a temporary file and a rename so readers never observe
//! a half-written blob.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::{keys, KvStore};

const EXTENSION: &str = "json";

/// `KvStore` backed by JSON files under a root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Create a store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let (namespace, name) =
            keys::split(key).ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        if !is_safe_segment(namespace) || !is_safe_segment(name) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self
            .root
            .join(namespace)
            .join(format!("{name}.{EXTENSION}")))
    }

    async fn namespace_dirs(&self, prefix: &str) -> Result<Vec<String>> {
        if let Some((namespace, _)) = keys::split(prefix) {
            return Ok(vec![namespace.to_string()]);
        }

        let mut out = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    out.push(name.to_string());
                }
            }
        }
        Ok(out)
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        tokio::fs::create_dir_all(dir).await?;

        let seq = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp-{}-{seq}", std::process::id()));

        if let Err(e) = tokio::fs::write(&tmp, &value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::trace!(path = %path.display(), bytes = value.len(), "Blob written");
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();

        for namespace in self.namespace_dirs(prefix).await? {
            let dir_path = self.root.join(&namespace);
            let mut dir = match tokio::fs::read_dir(&dir_path).await {
                Ok(dir) => dir,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = dir.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let key = format!("{namespace}{}{stem}", keys::SEPARATOR);
                if key.starts_with(prefix) {
                    out.push(key);
                }
            }
        }

        out.sort();
        Ok(out)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
