//! Service configuration.
//!
//! Everything is resolved once at startup from environment variables into an
//! immutable [`ServiceConfig`]. Missing optional settings fall back to
//! defaults and are reported by [`ServiceConfig::warnings`]; settings that
//! cannot work (unknown storage backend, unparseable numbers) fail fast.

use std::str::FromStr;
use std::sync::Arc;

use taxgate_core::CostPerCall;
use taxgate_store::{FileStore, KvStore, MemoryStore};

/// Default upstream tax-rate endpoint.
pub const DEFAULT_TAX_API_URL: &str = "https://taxjar.netlify.app/.netlify/functions/calculator";

/// Default Redis retention: one year.
pub const DEFAULT_REDIS_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// A required variable was missing.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// The selected storage backend was not compiled in.
    #[error("storage backend '{0}' is not enabled in this build")]
    BackendUnavailable(&'static str),

    /// The storage backend could not be opened.
    #[error("failed to open storage: {0}")]
    Storage(#[from] taxgate_store::StoreError),

    /// The upstream HTTP client could not be built.
    #[error("upstream client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The Slack client could not be built.
    #[error("slack client: {0}")]
    Notifier(#[from] crate::slack::NotifyError),
}

/// Where monthly logs and ledgers are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// In-process map; lost on restart.
    Memory,
    /// JSON files under `data_dir`.
    File {
        /// Root directory.
        data_dir: String,
    },
    /// `RocksDB` database under `data_dir`.
    Rocks {
        /// Database directory.
        data_dir: String,
    },
    /// Redis server.
    Redis {
        /// Connection URL.
        url: String,
        /// Retention TTL in seconds; `None` keeps blobs forever.
        ttl_secs: Option<u64>,
    },
}

impl StorageConfig {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Rocks { .. } => "rocksdb",
            Self::Redis { .. } => "redis",
        }
    }

    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not compiled in or cannot be opened.
    pub fn open(&self) -> Result<Arc<dyn KvStore>, ConfigError> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
            Self::File { data_dir } => Ok(Arc::new(FileStore::new(data_dir))),
            #[cfg(feature = "rocksdb-backend")]
            Self::Rocks { data_dir } => Ok(Arc::new(taxgate_store::RocksStore::open(data_dir)?)),
            #[cfg(not(feature = "rocksdb-backend"))]
            Self::Rocks { .. } => Err(ConfigError::BackendUnavailable("rocksdb")),
            #[cfg(feature = "redis-backend")]
            Self::Redis { url, ttl_secs } => Ok(Arc::new(
                taxgate_store::RedisStore::new(url)?.with_ttl(*ttl_secs),
            )),
            #[cfg(not(feature = "redis-backend"))]
            Self::Redis { .. } => Err(ConfigError::BackendUnavailable("redis")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: `0.0.0.0:$PORT`, port 3000).
    pub listen_addr: String,

    /// Test-tier API key.
    pub test_api_key: Option<String>,

    /// Prod-tier API key.
    pub prod_api_key: Option<String>,

    /// Price of one billable prod call.
    pub cost_per_call: CostPerCall,

    /// Upstream tax-rate endpoint.
    pub tax_api_url: String,

    /// Upstream request timeout in seconds.
    pub upstream_timeout_seconds: u64,

    /// Slack incoming-webhook URL.
    pub slack_webhook_url: Option<String>,

    /// Webhook request timeout in seconds.
    pub notify_timeout_seconds: u64,

    /// Storage backend.
    pub storage: StorageConfig,

    /// Directory holding static assets.
    pub static_dir: String,

    /// Secret for signing admin session cookies (falls back to the test key).
    pub admin_session_secret: Option<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Maximum concurrent tax lookups.
    pub max_concurrent_lookups: usize,

    /// Non-fatal problems found while loading.
    pub warnings: Vec<String>,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        let mut warnings = Vec::new();

        let listen_addr = match var("LISTEN_ADDR") {
            Some(addr) => addr,
            None => {
                let port: u16 = parse_or("PORT", var("PORT"), 3000)?;
                format!("0.0.0.0:{port}")
            }
        };

        let test_api_key = var("TEST_API_KEY");
        let prod_api_key = var("PROD_API_KEY");
        if test_api_key.is_none() && prod_api_key.is_none() {
            warnings.push("Neither TEST_API_KEY nor PROD_API_KEY is set; every key will be rejected".into());
        }

        let (cost_per_call, cost_warning) = CostPerCall::from_config(var("COST_PER_CALL").as_deref());
        warnings.extend(cost_warning);

        let slack_webhook_url = var("SLACK_WEBHOOK_URL");
        if slack_webhook_url.is_none() {
            warnings.push("SLACK_WEBHOOK_URL not set; billing notifications are disabled".into());
        }

        let data_dir = var("DATA_DIR").unwrap_or_else(|| "./data".into());
        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("file") {
            "file" => StorageConfig::File { data_dir },
            "memory" => {
                warnings.push("STORAGE_BACKEND=memory; logs and ledgers are lost on restart".into());
                StorageConfig::Memory
            }
            "rocksdb" => StorageConfig::Rocks { data_dir },
            "redis" => StorageConfig::Redis {
                url: var("REDIS_URL").ok_or(ConfigError::Missing("REDIS_URL"))?,
                ttl_secs: Some(parse_or(
                    "REDIS_TTL_SECONDS",
                    var("REDIS_TTL_SECONDS"),
                    DEFAULT_REDIS_TTL_SECS,
                )?),
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            listen_addr,
            test_api_key,
            prod_api_key,
            cost_per_call,
            tax_api_url: var("TAX_API_URL").unwrap_or(defaults.tax_api_url),
            upstream_timeout_seconds: parse_or(
                "UPSTREAM_TIMEOUT_SECONDS",
                var("UPSTREAM_TIMEOUT_SECONDS"),
                defaults.upstream_timeout_seconds,
            )?,
            slack_webhook_url,
            notify_timeout_seconds: parse_or(
                "NOTIFY_TIMEOUT_SECONDS",
                var("NOTIFY_TIMEOUT_SECONDS"),
                defaults.notify_timeout_seconds,
            )?,
            storage,
            static_dir: var("STATIC_DIR").unwrap_or(defaults.static_dir),
            admin_session_secret: var("ADMIN_SESSION_SECRET"),
            max_body_bytes: parse_or("MAX_BODY_BYTES", var("MAX_BODY_BYTES"), defaults.max_body_bytes)?,
            request_timeout_seconds: parse_or(
                "REQUEST_TIMEOUT_SECONDS",
                var("REQUEST_TIMEOUT_SECONDS"),
                defaults.request_timeout_seconds,
            )?,
            max_concurrent_lookups: parse_or(
                "MAX_CONCURRENT_LOOKUPS",
                var("MAX_CONCURRENT_LOOKUPS"),
                defaults.max_concurrent_lookups,
            )?,
            warnings,
        })
    }

    /// Non-fatal configuration problems, to be logged once at startup.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            test_api_key: None,
            prod_api_key: None,
            cost_per_call: CostPerCall::ZERO,
            tax_api_url: DEFAULT_TAX_API_URL.into(),
            upstream_timeout_seconds: 10,
            slack_webhook_url: None,
            notify_timeout_seconds: 5,
            storage: StorageConfig::File {
                data_dir: "./data".into(),
            },
            static_dir: "./static".into(),
            admin_session_secret: None,
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
            max_concurrent_lookups: 64,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.tax_api_url, DEFAULT_TAX_API_URL);
        assert!(config.cost_per_call.is_zero());
        assert_eq!(config.storage.name(), "file");
        // no keys, no cost, no webhook
        assert_eq!(config.warnings().len(), 3);
    }

    #[test]
    fn missing_webhook_is_warned_once() {
        let config = load(&[("TEST_API_KEY", "k"), ("COST_PER_CALL", "1")]).unwrap();
        let slack_warnings = config
            .warnings()
            .iter()
            .filter(|w| w.contains("SLACK_WEBHOOK_URL"))
            .count();
        assert_eq!(slack_warnings, 1);
    }

    #[test]
    fn port_builds_listen_addr() {
        let config = load(&[("PORT", "8081")]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8081");

        let config = load(&[("PORT", "8081"), ("LISTEN_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn full_configuration_has_no_warnings() {
        let config = load(&[
            ("TEST_API_KEY", "test-key"),
            ("PROD_API_KEY", "prod-key"),
            ("COST_PER_CALL", "0.75"),
            ("SLACK_WEBHOOK_URL", "https://hooks.slack.example/T000"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(config.test_api_key.as_deref(), Some("test-key"));
        assert_eq!(config.cost_per_call.amount(), 0.75);
        assert_eq!(config.storage, StorageConfig::Memory);
        // only the memory-backend notice remains
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn invalid_cost_is_a_warning_not_an_error() {
        let config = load(&[("COST_PER_CALL", "-3")]).unwrap();
        assert!(config.cost_per_call.is_zero());
        assert!(config.warnings().iter().any(|w| w.contains("COST_PER_CALL")));
    }

    #[test]
    fn invalid_numbers_fail_fast() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(load(&[("UPSTREAM_TIMEOUT_SECONDS", "-1")]).is_err());
    }

    #[test]
    fn unknown_backend_fails_fast() {
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "postgres")]),
            Err(ConfigError::InvalidValue { name: "STORAGE_BACKEND", .. })
        ));
    }

    #[test]
    fn redis_backend_requires_url() {
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "redis")]),
            Err(ConfigError::Missing("REDIS_URL"))
        ));
        let config = load(&[("STORAGE_BACKEND", "redis"), ("REDIS_URL", "redis://localhost")]).unwrap();
        assert_eq!(config.storage.name(), "redis");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("TEST_API_KEY", "   "), ("PROD_API_KEY", "")]).unwrap();
        assert!(config.test_api_key.is_none());
        assert!(config.prod_api_key.is_none());
    }

    #[test]
    fn memory_backend_opens() {
        let store = StorageConfig::Memory.open().unwrap();
        assert_eq!(store.backend_name(), "memory");
    }
}
