use rust_decimal::Decimal;
use thiserror::Error;

/// Custom error type for pricing operations
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Invalid quantity: {0} (must be >= 0)")]
    InvalidQuantity(Decimal),
    #[error("Invalid exchange rate override: {0}")]
    InvalidRateOverride(String),
}

/// Result type for pricing operations
pub type Result<T> = std::result::Result<T, PricingError>;
