//! Error types for the core crate.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while parsing core values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A month key was not of the form `YYYY-MM`.
    #[error("invalid month key: {0}")]
    InvalidMonth(String),

    /// A cost value was negative, not finite, or not a number.
    #[error("invalid cost: {0}")]
    InvalidCost(String),
}
