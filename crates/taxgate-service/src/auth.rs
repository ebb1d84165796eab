//! Authentication for tax lookups and the admin dashboard.
//!
//! - [`ApiKeyHeader`] - extractor for the optional `x-api-key` header
//! - [`ApiKeyValidator`] - classifies a key as test, prod or invalid
//! - [`AdminSessions`] - password check and signed session cookies

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use taxgate_core::{ApiKeyClass, ApiKeyTier};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};
use crate::error::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin_session";

/// How long an admin session stays valid, in seconds.
pub const SESSION_TTL_SECS: i64 = 3600;

// ============================================================================
// API keys
// ============================================================================

/// The `x-api-key` header, if the caller sent a non-blank one.
///
/// Bytes that are not UTF-8 are replaced, so such a key is still present
/// and gets rejected rather than treated as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyHeader(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ApiKeyHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .filter(|v| !v.trim().is_empty());

        Ok(Self(key))
    }
}

/// Maps caller-supplied keys to billing tiers.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyValidator {
    test_key: Option<String>,
    prod_key: Option<String>,
}

impl ApiKeyValidator {
    /// Create a validator. Empty secrets are treated as unset.
    #[must_use]
    pub fn new(test_key: Option<String>, prod_key: Option<String>) -> Self {
        Self {
            test_key: test_key.filter(|k| !k.is_empty()),
            prod_key: prod_key.filter(|k| !k.is_empty()),
        }
    }

    /// Classify a key by exact, case-sensitive comparison.
    #[must_use]
    pub fn classify(&self, key: Option<&str>) -> ApiKeyClass {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return ApiKeyClass::Invalid;
        };

        if matches_secret(self.test_key.as_deref(), key) {
            ApiKeyClass::Test
        } else if matches_secret(self.prod_key.as_deref(), key) {
            ApiKeyClass::Prod
        } else {
            ApiKeyClass::Invalid
        }
    }

    /// Classify a key, rejecting anything that is not test or prod.
    pub fn require(&self, key: Option<&str>) -> Result<ApiKeyTier, ApiError> {
        self.classify(key).tier().ok_or(ApiError::Unauthorized)
    }
}

fn matches_secret(secret: Option<&str>, candidate: &str) -> bool {
    secret.is_some_and(|secret| constant_time_eq(secret, candidate))
}

// ============================================================================
// Admin sessions
// ============================================================================

/// Admin login and session cookies.
///
/// The admin password is the test API key. A session token is
/// `<issued_unix_secs>.<hmac>` where the HMAC covers the issue time, so a
/// token cannot be forged or extended without the secret.
#[derive(Debug, Clone, Default)]
pub struct AdminSessions {
    password: Option<String>,
    secret: Option<String>,
}

impl AdminSessions {
    /// Create the session manager.
    ///
    /// `secret` signs the cookies and falls back to `password` when unset.
    #[must_use]
    pub fn new(password: Option<String>, secret: Option<String>) -> Self {
        let password = password.filter(|p| !p.is_empty());
        let secret = secret.filter(|s| !s.is_empty()).or_else(|| password.clone());
        Self { password, secret }
    }

    /// Whether `candidate` is the admin password. Always false when no
    /// password is configured.
    #[must_use]
    pub fn check_password(&self, candidate: Option<&str>) -> bool {
        match (self.password.as_deref(), candidate) {
            (Some(expected), Some(candidate)) => constant_time_eq(expected, candidate),
            _ => false,
        }
    }

    /// Issue a session token stamped with `now`.
    ///
    /// Returns `None` when there is no signing secret.
    #[must_use]
    pub fn issue(&self, now: DateTime<Utc>) -> Option<String> {
        let secret = self.secret.as_deref()?;
        let issued = now.timestamp();
        Some(format!("{issued}.{}", sign(secret, issued)))
    }

    /// Whether `token` is authentic and younger than [`SESSION_TTL_SECS`].
    #[must_use]
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            return false;
        };
        let Some((issued, signature)) = token.split_once('.') else {
            return false;
        };
        let Ok(issued) = issued.parse::<i64>() else {
            return false;
        };

        let age = now.timestamp() - issued;
        (0..SESSION_TTL_SECS).contains(&age) && constant_time_eq(&sign(secret, issued), signature)
    }

    /// Whether the request headers carry a valid session cookie.
    #[must_use]
    pub fn is_authenticated(&self, headers: &HeaderMap, now: DateTime<Utc>) -> bool {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(session_token)
            .any(|token| self.verify(token, now))
    }

    /// `Set-Cookie` value for a fresh session token.
    #[must_use]
    pub fn set_cookie(token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly; Path=/admin; Max-Age={SESSION_TTL_SECS}; SameSite=Lax"
        )
    }
}

fn sign(secret: &str, issued: i64) -> String {
    hmac_sha256_hex(secret, &format!("{SESSION_COOKIE}:{issued}"))
}

/// Extract the session token from a `Cookie` header value.
fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};
    use chrono::Duration;

    async fn extract_key(value: HeaderValue) -> ApiKeyHeader {
        let (mut parts, ()) = Request::builder()
            .header(API_KEY_HEADER, value)
            .body(())
            .unwrap()
            .into_parts();
        ApiKeyHeader::from_request_parts(&mut parts, &())
            .await
            .unwrap()
    }

    fn validator() -> ApiKeyValidator {
        ApiKeyValidator::new(Some("test-secret".into()), Some("prod-secret".into()))
    }

    // ========================================================================
    // API keys
    // ========================================================================

    #[test]
    fn classify_known_keys() {
        let v = validator();
        assert_eq!(v.classify(Some("test-secret")), ApiKeyClass::Test);
        assert_eq!(v.classify(Some("prod-secret")), ApiKeyClass::Prod);
    }

    #[test]
    fn classify_rejects_missing_empty_and_unknown() {
        let v = validator();
        assert_eq!(v.classify(None), ApiKeyClass::Invalid);
        assert_eq!(v.classify(Some("")), ApiKeyClass::Invalid);
        assert_eq!(v.classify(Some("invalid-key")), ApiKeyClass::Invalid);
    }

    #[test]
    fn classify_is_case_sensitive_and_exact() {
        let v = validator();
        assert_eq!(v.classify(Some("TEST-SECRET")), ApiKeyClass::Invalid);
        assert_eq!(v.classify(Some("test-secret ")), ApiKeyClass::Invalid);
        assert_eq!(v.classify(Some("prod-secre")), ApiKeyClass::Invalid);
    }

    #[test]
    fn unset_secrets_never_match() {
        let v = ApiKeyValidator::new(None, Some(String::new()));
        assert_eq!(v.classify(Some("")), ApiKeyClass::Invalid);
        assert_eq!(v.classify(Some("anything")), ApiKeyClass::Invalid);
    }

    #[tokio::test]
    async fn blank_header_is_absent() {
        assert_eq!(extract_key(HeaderValue::from_static("   ")).await, ApiKeyHeader(None));
    }

    #[tokio::test]
    async fn non_utf8_header_is_present_and_rejected() {
        let ApiKeyHeader(key) = extract_key(HeaderValue::from_bytes(b"key-\xff").unwrap()).await;
        assert!(key.is_some());
        assert!(matches!(
            validator().require(key.as_deref()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn require_maps_invalid_to_unauthorized() {
        let v = validator();
        assert_eq!(v.require(Some("prod-secret")).unwrap(), ApiKeyTier::Prod);
        assert!(matches!(
            v.require(Some("nope")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(v.require(None), Err(ApiError::Unauthorized)));
    }

    // ========================================================================
    // Admin sessions
    // ========================================================================

    #[test]
    fn password_is_the_test_key() {
        let sessions = AdminSessions::new(Some("test-secret".into()), None);
        assert!(sessions.check_password(Some("test-secret")));
        assert!(!sessions.check_password(Some("prod-secret")));
        assert!(!sessions.check_password(None));
    }

    #[test]
    fn no_password_means_no_login() {
        let sessions = AdminSessions::new(None, None);
        assert!(!sessions.check_password(Some("")));
        assert!(sessions.issue(Utc::now()).is_none());
        assert!(!sessions.verify("0.abc", Utc::now()));
    }

    #[test]
    fn issued_token_verifies_until_expiry() {
        let sessions = AdminSessions::new(Some("pw".into()), Some("signing".into()));
        let now = Utc::now();
        let token = sessions.issue(now).unwrap();

        assert!(sessions.verify(&token, now));
        assert!(sessions.verify(&token, now + Duration::seconds(SESSION_TTL_SECS - 1)));
        assert!(!sessions.verify(&token, now + Duration::seconds(SESSION_TTL_SECS)));
        assert!(!sessions.verify(&token, now - Duration::seconds(5)));
    }

    #[test]
    fn tampered_or_foreign_tokens_fail() {
        let sessions = AdminSessions::new(Some("pw".into()), Some("signing".into()));
        let other = AdminSessions::new(Some("pw".into()), Some("other".into()));
        let now = Utc::now();
        let token = sessions.issue(now).unwrap();

        assert!(!other.verify(&token, now));

        let (issued, sig) = token.split_once('.').unwrap();
        let extended = format!("{}.{sig}", issued.parse::<i64>().unwrap() + 60);
        assert!(!sessions.verify(&extended, now + Duration::seconds(60)));

        assert!(!sessions.verify("not-a-token", now));
        assert!(!sessions.verify("admin_1700000000", now));
    }

    #[test]
    fn secret_falls_back_to_password() {
        let a = AdminSessions::new(Some("pw".into()), None);
        let b = AdminSessions::new(Some("pw".into()), Some("pw".into()));
        let now = Utc::now();
        assert!(b.verify(&a.issue(now).unwrap(), now));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let sessions = AdminSessions::new(Some("pw".into()), None);
        let now = Utc::now();
        let token = sessions.issue(now).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}; lang=en")).unwrap(),
        );
        assert!(sessions.is_authenticated(&headers, now));

        let mut forged = HeaderMap::new();
        forged.insert(COOKIE, HeaderValue::from_static("admin_session=YWRtaW5fMTcwMDAwMDAwMA=="));
        assert!(!sessions.is_authenticated(&forged, now));
        assert!(!sessions.is_authenticated(&HeaderMap::new(), now));
    }

    #[test]
    fn set_cookie_attributes() {
        let cookie = AdminSessions::set_cookie("123.abc");
        assert_eq!(
            cookie,
            "admin_session=123.abc; HttpOnly; Path=/admin; Max-Age=3600; SameSite=Lax"
        );
    }
}
