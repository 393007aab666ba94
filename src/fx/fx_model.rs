use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_LOCAL_PER_USD;
use crate::fx::fx_errors::FxError;

/// The two currencies pricing data is stored and quoted in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Local,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Local => "LOCAL",
            Currency::Usd => "USD",
        }
    }

    /// Parses a stored currency code. Case-insensitive; an empty code maps to
    /// the local currency (legacy rows leave the column blank).
    pub fn from_code(code: &str) -> Option<Currency> {
        match code.trim().to_uppercase().as_str() {
            "" | "LOCAL" => Some(Currency::Local),
            "USD" | "US$" => Some(Currency::Usd),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A value tagged with its currency. Amounts in different currencies are
/// never compared or combined without going through the converter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryAmount {
    pub value: Decimal,
    pub currency: Currency,
}

impl MonetaryAmount {
    pub fn new(value: Decimal, currency: Currency) -> Self {
        MonetaryAmount { value, currency }
    }

    pub fn local(value: Decimal) -> Self {
        MonetaryAmount::new(value, Currency::Local)
    }

    pub fn usd(value: Decimal) -> Self {
        MonetaryAmount::new(value, Currency::Usd)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// Where the exchange-rate snapshot for a quote came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RateSource {
    Store,
    Override,
    Fallback,
}

/// One exchange-rate snapshot (LOCAL per USD), taken once per quote
/// computation and held fixed for its lifetime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub local_per_usd: Decimal,
    pub source: RateSource,
    pub timestamp: DateTime<Utc>,
}

impl ExchangeRate {
    /// Builds a snapshot from the raw stored setting, falling back to
    /// [`DEFAULT_LOCAL_PER_USD`] when the value is absent, unparsable or
    /// non-positive.
    pub fn from_store_setting(raw: Option<&str>) -> Self {
        let parsed = raw
            .and_then(|s| s.trim().parse::<Decimal>().ok())
            .filter(|r| *r > Decimal::ZERO);

        match parsed {
            Some(rate) => ExchangeRate {
                local_per_usd: rate,
                source: RateSource::Store,
                timestamp: Utc::now(),
            },
            None => {
                log::warn!(
                    "Exchange rate setting missing or unparsable ({:?}), using fallback {}",
                    raw,
                    DEFAULT_LOCAL_PER_USD
                );
                ExchangeRate {
                    local_per_usd: DEFAULT_LOCAL_PER_USD,
                    source: RateSource::Fallback,
                    timestamp: Utc::now(),
                }
            }
        }
    }

    /// Builds a snapshot from a caller-supplied override rate.
    pub fn from_override(rate: Decimal) -> Result<Self, FxError> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "Override exchange rate must be positive, got {}",
                rate
            )));
        }
        Ok(ExchangeRate {
            local_per_usd: rate,
            source: RateSource::Override,
            timestamp: Utc::now(),
        })
    }

    pub fn fell_back(&self) -> bool {
        self.source == RateSource::Fallback
    }
}
