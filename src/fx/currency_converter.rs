use rust_decimal::Decimal;

use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::{Currency, ExchangeRate, MonetaryAmount};

/// Converts tagged monetary amounts between the two supported currencies
/// using one fixed exchange-rate snapshot.
///
/// The rate is validated once at construction, so conversions themselves
/// cannot fail mid-calculation.
pub struct CurrencyConverter {
    rate: ExchangeRate,
}

impl CurrencyConverter {
    /// Creates a converter over one snapshot. A zero or negative rate is
    /// rejected here; callers go through [`ExchangeRate`] constructors which
    /// already guarantee a positive value.
    pub fn new(rate: ExchangeRate) -> Result<Self, FxError> {
        if rate.local_per_usd <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Exchange rate must be positive, got {}",
                rate.local_per_usd
            )));
        }
        Ok(CurrencyConverter { rate })
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    /// Converts an amount to the target currency. Same-currency amounts pass
    /// through unchanged. LOCAL = USD × rate; USD = LOCAL ÷ rate.
    pub fn convert(&self, amount: MonetaryAmount, to: Currency) -> MonetaryAmount {
        if amount.currency == to {
            return amount;
        }

        // Only two currencies exist, so after the passthrough above the
        // source is always the other one.
        let value = match to {
            Currency::Local => amount.value * self.rate.local_per_usd,
            Currency::Usd => amount.value / self.rate.local_per_usd,
        };

        MonetaryAmount::new(value, to)
    }

    /// Convenience wrapper converting a bare value between currencies.
    pub fn convert_value(&self, value: Decimal, from: Currency, to: Currency) -> Decimal {
        self.convert(MonetaryAmount::new(value, from), to).value
    }
}
