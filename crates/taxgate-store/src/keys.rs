//! Key encoding for monthly blobs.
//!
//! Keys have the form `<namespace>:<YYYY-MM>`, e.g. `logs:2025-03`.

use taxgate_core::MonthKey;

/// Namespace of monthly query logs.
pub const QUERY_LOGS: &str = "logs";

/// Namespace of monthly cost ledgers.
pub const COST_LOGS: &str = "costs";

/// Separator between namespace and month.
pub const SEPARATOR: char = ':';

/// Build the key of `month` in `namespace`.
#[must_use]
pub fn month_key(namespace: &str, month: &MonthKey) -> String {
    format!("{namespace}{SEPARATOR}{month}")
}

/// Prefix shared by every key in `namespace`.
#[must_use]
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}{SEPARATOR}")
}

/// Split a key into namespace and remainder.
#[must_use]
pub fn split(key: &str) -> Option<(&str, &str)> {
    key.split_once(SEPARATOR)
}

/// Extract the month from a key in `namespace`.
///
/// Returns `None` for keys of another namespace or with a malformed month.
#[must_use]
pub fn month_of(namespace: &str, key: &str) -> Option<MonthKey> {
    let (ns, month) = split(key)?;
    if ns != namespace {
        return None;
    }
    month.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_format() {
        let month: MonthKey = "2025-03".parse().unwrap();
        assert_eq!(month_key(QUERY_LOGS, &month), "logs:2025-03");
        assert_eq!(month_key(COST_LOGS, &month), "costs:2025-03");
    }

    #[test]
    fn month_of_roundtrip() {
        let month: MonthKey = "2024-11".parse().unwrap();
        let key = month_key(COST_LOGS, &month);
        assert_eq!(month_of(COST_LOGS, &key), Some(month));
    }

    #[test]
    fn month_of_rejects_other_namespaces_and_garbage() {
        assert_eq!(month_of(COST_LOGS, "logs:2024-11"), None);
        assert_eq!(month_of(COST_LOGS, "costs:latest"), None);
        assert_eq!(month_of(COST_LOGS, "costs"), None);
    }
}
