//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, assets, docs, health, not_found, tax};
use crate::state::AppState;

// ============================================================================
// CORS
// ============================================================================

const ALLOW_ORIGIN: &str = "*";
const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type, x-api-key";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Tax API (`x-api-key` auth, concurrency-limited)
/// - `GET /` - Tax lookup, or the usage guide when no key is sent
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /docs` - Documentation page
/// - `GET /docs/dev` - Swagger UI
/// - `GET /docs/dev/openapi.json`, `GET /docs/openapi.json` - OpenAPI document
/// - `GET /static/og.png` - Social preview image
///
/// ## Admin (password login, session cookie)
/// - `GET /admin` - Dashboard or login page
/// - `POST /admin` - Login
///
/// Any `OPTIONS` request is answered `200 ok` and every response carries
/// the CORS headers.
pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let max_concurrent_lookups = state.config.max_concurrent_lookups.max(1);

    let state = Arc::new(state);

    // Lookups hold an upstream connection for up to the upstream timeout.
    let tax_routes = Router::new()
        .route("/", get(tax::root))
        .layer(ConcurrencyLimitLayer::new(max_concurrent_lookups));

    Router::new()
        .merge(tax_routes)
        .route("/health", get(health::health))
        // Admin
        .route("/admin", get(admin::page).post(admin::login))
        .route("/admin/", get(admin::page).post(admin::login))
        // Docs
        .route("/docs", get(docs::docs_page))
        .route("/docs/dev", get(docs::swagger_page))
        .route("/docs/dev/openapi.json", get(docs::openapi))
        .route("/docs/openapi.json", get(docs::openapi))
        // Static
        .route("/static/og.png", get(assets::og_image))
        .fallback(not_found)
        // Global middleware
        .layer(middleware::from_fn(preflight))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_seconds)))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_header("access-control-allow-origin", ALLOW_ORIGIN))
        .layer(cors_header("access-control-allow-headers", ALLOW_HEADERS))
        .layer(cors_header("access-control-allow-methods", ALLOW_METHODS))
        .with_state(state)
}

fn cors_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

/// Answer every `OPTIONS` request before routing, whatever the path.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return "ok".into_response();
    }
    next.run(request).await
}
