use thiserror::Error;

/// Custom error type for currency operations
#[derive(Debug, Error)]
pub enum FxError {
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

/// Result type for currency operations
pub type Result<T> = std::result::Result<T, FxError>;
