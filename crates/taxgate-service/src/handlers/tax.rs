//! Tax lookup handler.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use taxgate_core::TaxQuery;

use crate::auth::ApiKeyHeader;
use crate::error::ApiError;
use crate::handlers::docs;
use crate::state::AppState;

/// Query parameters accepted by the root endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TaxParams {
    /// ZIP or postal code.
    pub zip: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Street address.
    pub street: Option<String>,
}

impl From<TaxParams> for TaxQuery {
    fn from(params: TaxParams) -> Self {
        TaxQuery::new(
            params.country.unwrap_or_default(),
            params.zip,
            params.city,
            params.street,
        )
    }
}

/// `GET /`: usage text without a key, a tax lookup with one.
///
/// The upstream status and body are returned verbatim.
pub async fn root(
    State(state): State<Arc<AppState>>,
    ApiKeyHeader(key): ApiKeyHeader,
    Query(params): Query<TaxParams>,
) -> Result<Response, ApiError> {
    if key.is_none() {
        return Ok(docs::usage().await.into_response());
    }

    let tier = state.keys.require(key.as_deref())?;
    let query = TaxQuery::from(params);

    tracing::debug!(
        tier = %tier,
        zip = query.zip.as_deref().unwrap_or(""),
        country = %query.country,
        "Tax lookup"
    );

    let call = state.pipeline.process(tier, query).await;
    let status =
        StatusCode::from_u16(call.outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok((status, Json(call.outcome.body)).into_response())
}
