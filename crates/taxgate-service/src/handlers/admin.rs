//! Admin dashboard handlers.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AdminSessions;
use crate::dashboard::{self, DashboardStats};
use crate::state::AppState;

const LOGIN_HTML: &str = include_str!("../../assets/login.html");
const LOGIN_ERROR: &str = r#"<div class="error">Invalid password. Please try again.</div>"#;

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Admin password.
    pub password: Option<String>,
}

fn login_page(error: bool) -> Html<String> {
    Html(LOGIN_HTML.replace("{{error}}", if error { LOGIN_ERROR } else { "" }))
}

/// `GET /admin`: the dashboard for a signed-in admin, the login page otherwise.
pub async fn page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !state.admin.is_authenticated(&headers, Utc::now()) {
        return login_page(false).into_response();
    }

    let logs = state.query_log.list_all().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load query logs for dashboard");
        Vec::new()
    });
    let costs = state.ledger.list_all().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load cost ledgers for dashboard");
        Vec::new()
    });

    let stats = DashboardStats::compute(&logs, &costs);
    Html(dashboard::render(&stats)).into_response()
}

/// `POST /admin`: check the password and start a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return login_page(false).into_response();
    };

    if !state.admin.check_password(form.password.as_deref()) {
        tracing::warn!("Admin login rejected");
        return (StatusCode::UNAUTHORIZED, login_page(true)).into_response();
    }

    let Some(token) = state.admin.issue(Utc::now()) else {
        return (StatusCode::UNAUTHORIZED, login_page(true)).into_response();
    };

    tracing::info!("Admin session started");
    (
        StatusCode::FOUND,
        [
            (SET_COOKIE, AdminSessions::set_cookie(&token)),
            (LOCATION, "/admin".to_string()),
        ],
    )
        .into_response()
}
