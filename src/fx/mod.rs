pub mod currency_converter;
pub mod fx_errors;
pub mod fx_model;

pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{Currency, ExchangeRate, MonetaryAmount, RateSource};
