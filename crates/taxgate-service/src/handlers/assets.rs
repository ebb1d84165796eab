//! Static asset handlers.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /static/og.png`: the social preview image.
pub async fn og_image(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let path = Path::new(&state.config.static_dir).join("og.png");

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [
                (CONTENT_TYPE, "image/png"),
                (CACHE_CONTROL, "public, max-age=86400"),
            ],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Static asset missing");
            Err(ApiError::NotFound("Not found".to_string()))
        }
        Err(e) => Err(ApiError::Internal(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}
