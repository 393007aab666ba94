use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::fx::currency_converter::CurrencyConverter;
use crate::fx::fx_model::ExchangeRate;
use crate::pricing::breakdown;
use crate::pricing::calculator::PriceCalculator;
use crate::pricing::pricing_errors::PricingError;
use crate::pricing::pricing_model::{
    Diagnostic, DiagnosticCode, PriceQuoteRequest, PriceQuoteResult, PricingRule,
};
use crate::pricing::pricing_traits::{PricingServiceTrait, RuleStoreTrait};
use crate::pricing::profile_resolver::resolve_groups;
use crate::pricing::rule_selector::select_winner;

/// The pricing resolution engine. Stateless between calls: each quote is a
/// pure function of the request plus one point-in-time rule store read and
/// one exchange-rate snapshot.
#[derive(Clone)]
pub struct PricingService {
    store: Arc<dyn RuleStoreTrait>,
}

impl PricingService {
    pub fn new(store: Arc<dyn RuleStoreTrait>) -> Self {
        PricingService { store }
    }

    /// Takes the exchange-rate snapshot for one computation: a caller
    /// override wins, otherwise the store setting with the documented
    /// fallback constant.
    fn snapshot_rate(
        &self,
        rate_override: Option<Decimal>,
    ) -> Result<(ExchangeRate, Option<Diagnostic>)> {
        if let Some(rate) = rate_override {
            let snapshot = ExchangeRate::from_override(rate).map_err(|e| {
                PricingError::InvalidRateOverride(e.to_string())
            })?;
            return Ok((snapshot, None));
        }

        let raw = self.store.get_exchange_rate()?;
        let snapshot = ExchangeRate::from_store_setting(raw.as_deref());
        let diagnostic = snapshot.fell_back().then(|| {
            Diagnostic::new(
                DiagnosticCode::MissingExchangeRate,
                format!(
                    "Exchange rate setting missing or unparsable; using fallback {}",
                    snapshot.local_per_usd
                ),
            )
        });
        Ok((snapshot, diagnostic))
    }

    /// Runs the full pipeline under an already-taken rate snapshot:
    /// validate, resolve groups, select per-group winners, compose, record.
    fn calculate_with_rate(
        &self,
        request: &PriceQuoteRequest,
        rate: ExchangeRate,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<PriceQuoteResult> {
        if request.quantity < Decimal::ZERO {
            return Err(PricingError::InvalidQuantity(request.quantity).into());
        }

        let converter = CurrencyConverter::new(rate)?;

        let resolved = resolve_groups(self.store.as_ref(), request)?;
        diagnostics.extend(resolved.diagnostics);

        let winners: Vec<PricingRule> = resolved
            .groups
            .iter()
            .filter_map(|group| select_winner(group, &request.article, request.quantity))
            .cloned()
            .collect();

        log::debug!(
            "Pricing '{}' x {}: {} candidate groups, {} winning rules",
            request.article,
            request.quantity,
            resolved.groups.len(),
            winners.len()
        );

        let base_prices = self.store.get_base_prices(&request.article)?;
        let calculator = PriceCalculator::new(&converter);
        let outcome = calculator.calculate(request, &base_prices, &winners, diagnostics);

        Ok(breakdown::record(outcome))
    }
}

impl PricingServiceTrait for PricingService {
    fn calculate_price(&self, request: &PriceQuoteRequest) -> Result<PriceQuoteResult> {
        let (rate, rate_diagnostic) = self.snapshot_rate(request.exchange_rate_override)?;
        self.calculate_with_rate(request, rate, rate_diagnostic.into_iter().collect())
    }

    fn calculate_price_batch(
        &self,
        requests: &[PriceQuoteRequest],
    ) -> Result<Vec<PriceQuoteResult>> {
        // One snapshot for the whole batch; per-request overrides still win
        // for their own request.
        let (batch_rate, rate_diagnostic) = self.snapshot_rate(None)?;

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let (rate, diagnostic) = match request.exchange_rate_override {
                Some(_) => self.snapshot_rate(request.exchange_rate_override)?,
                None => (batch_rate.clone(), rate_diagnostic.clone()),
            };
            results.push(self.calculate_with_rate(
                request,
                rate,
                diagnostic.into_iter().collect(),
            )?);
        }
        Ok(results)
    }
}
