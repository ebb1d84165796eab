//! HTTP handlers.

pub mod admin;
pub mod assets;
pub mod docs;
pub mod health;
pub mod tax;

use crate::error::ApiError;

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
