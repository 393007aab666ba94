use rust_decimal::Decimal;

use crate::constants::DECIMAL_PRECISION;
use crate::fx::currency_converter::CurrencyConverter;
use crate::fx::fx_model::Currency;
use crate::pricing::pricing_model::{
    BasePrice, Diagnostic, DiagnosticCode, PriceQuoteRequest, PricingRule, RuleKind, RuleSource,
};

/// How the winning base of a quote was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseResolution {
    /// No discount, fixed-price or formula rule applied.
    ListPrice,
    Discount {
        source: RuleSource,
        amount_removed: Decimal,
        /// Lesser discounts that lost the competition.
        ignored: usize,
    },
    FixedPrice {
        source: RuleSource,
        price: Decimal,
        /// Best discount outcome beaten by the fixed price, if any.
        suppressed_discount: Option<(RuleSource, Decimal)>,
        ignored_discounts: usize,
    },
    /// Formula precedence is absolute: a formula rule overrides both the
    /// discount and fixed-price outcomes by design, not because its value
    /// happens to be lower.
    Formula {
        source: RuleSource,
        value: Decimal,
        variable: String,
        variable_value: Decimal,
    },
}

/// One surcharge applied on top of the winning base.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedSurcharge {
    pub source: RuleSource,
    pub amount: Decimal,
    /// Set when the surcharge was percentage-based.
    pub percent: Option<Decimal>,
}

/// Intermediate values of one quote computation. The breakdown recorder is
/// purely derivative of this; it never re-derives the math.
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub article: String,
    pub quantity: Decimal,
    pub currency: Currency,
    pub base_price: Decimal,
    pub base_price_missing: bool,
    pub resolution: BaseResolution,
    pub winning_base: Decimal,
    pub surcharges: Vec<AppliedSurcharge>,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub diagnostics: Vec<Diagnostic>,
}

/// Combines the per-group winning rules into one final price: largest
/// discount vs cheapest fixed price, formula override, then additive
/// surcharges. Never fails once inputs passed validation; degenerate data
/// degrades to a defined numeric fallback instead.
pub struct PriceCalculator<'a> {
    converter: &'a CurrencyConverter,
}

impl<'a> PriceCalculator<'a> {
    pub fn new(converter: &'a CurrencyConverter) -> Self {
        PriceCalculator { converter }
    }

    /// `winners` holds at most one rule per group, in group resolution
    /// order; that order breaks the remaining ties documented below.
    pub fn calculate(
        &self,
        request: &PriceQuoteRequest,
        base_prices: &[BasePrice],
        winners: &[PricingRule],
        mut diagnostics: Vec<Diagnostic>,
    ) -> QuoteOutcome {
        let target = request.target_currency;
        let (base_price, base_price_missing) =
            self.resolve_base_price(&request.article, base_prices, target, &mut diagnostics);

        // Discount class: largest removable amount wins, the rest are only
        // counted. First group wins exact ties.
        let mut best_discount: Option<(RuleSource, Decimal)> = None;
        let mut discount_count = 0usize;

        // Fixed-price class: minimum converted value wins.
        let mut best_fixed: Option<(RuleSource, Decimal)> = None;

        // Formula class: first eligible by group resolution order wins.
        let mut formula: Option<(RuleSource, Decimal, String, Decimal)> = None;

        let mut surcharges: Vec<AppliedSurcharge> = Vec::new();

        for rule in winners {
            match &rule.kind {
                RuleKind::PercentageDiscount { percent } => {
                    discount_count += 1;
                    let removable = base_price * percent / Decimal::ONE_HUNDRED;
                    if best_discount
                        .as_ref()
                        .map_or(true, |(_, best)| removable > *best)
                    {
                        best_discount = Some((rule.source.clone(), removable));
                    }
                }
                RuleKind::FixedSubtract { amount } => {
                    discount_count += 1;
                    let removable = self.converter.convert(*amount, target).value;
                    if best_discount
                        .as_ref()
                        .map_or(true, |(_, best)| removable > *best)
                    {
                        best_discount = Some((rule.source.clone(), removable));
                    }
                }
                RuleKind::FixedPrice { price } => {
                    let converted = self.converter.convert(*price, target).value;
                    if best_fixed
                        .as_ref()
                        .map_or(true, |(_, best)| converted < *best)
                    {
                        best_fixed = Some((rule.source.clone(), converted));
                    }
                }
                RuleKind::Formula(f) => {
                    if formula.is_none() {
                        let variable_value = request
                            .formula_variables
                            .get(&f.variable)
                            .copied()
                            .unwrap_or_else(|| {
                                log::debug!(
                                    "Formula variable '{}' not supplied, defaulting to 0",
                                    f.variable
                                );
                                Decimal::ZERO
                            });
                        formula = Some((
                            rule.source.clone(),
                            f.evaluate(variable_value),
                            f.variable.clone(),
                            variable_value,
                        ));
                    }
                }
                RuleKind::PercentageSurcharge { .. } | RuleKind::FixedSurcharge { .. } => {
                    // Applied after the winning base is known.
                }
            }
        }

        let option_a = match &best_discount {
            Some((_, removable)) => (base_price - removable).max(Decimal::ZERO),
            None => base_price,
        };

        let resolution = if let Some((source, value, variable, variable_value)) = formula {
            BaseResolution::Formula {
                source,
                value,
                variable,
                variable_value,
            }
        } else if let Some((fixed_source, fixed_price)) = &best_fixed {
            if *fixed_price < option_a {
                BaseResolution::FixedPrice {
                    source: fixed_source.clone(),
                    price: *fixed_price,
                    suppressed_discount: best_discount.clone(),
                    ignored_discounts: discount_count.saturating_sub(1),
                }
            } else {
                self.discount_or_list(best_discount, discount_count)
            }
        } else {
            self.discount_or_list(best_discount, discount_count)
        };

        let winning_base = match &resolution {
            BaseResolution::ListPrice => base_price,
            BaseResolution::Discount { .. } => option_a,
            BaseResolution::FixedPrice { price, .. } => *price,
            BaseResolution::Formula { value, .. } => *value,
        };

        // Surcharges all stack; percentages are computed against the
        // winning base, not the original list price.
        for rule in winners {
            match &rule.kind {
                RuleKind::PercentageSurcharge { percent } => {
                    surcharges.push(AppliedSurcharge {
                        source: rule.source.clone(),
                        amount: winning_base * percent / Decimal::ONE_HUNDRED,
                        percent: Some(*percent),
                    });
                }
                RuleKind::FixedSurcharge { amount } => {
                    surcharges.push(AppliedSurcharge {
                        source: rule.source.clone(),
                        amount: self.converter.convert(*amount, target).value,
                        percent: None,
                    });
                }
                _ => {}
            }
        }

        let surcharge_total: Decimal = surcharges.iter().map(|s| s.amount).sum();
        let unit_price = (winning_base + surcharge_total)
            .max(Decimal::ZERO)
            .round_dp(DECIMAL_PRECISION);
        let total_price = unit_price * request.quantity;

        QuoteOutcome {
            article: request.article.clone(),
            quantity: request.quantity,
            currency: target,
            base_price,
            base_price_missing,
            resolution,
            winning_base,
            surcharges,
            unit_price,
            total_price,
            diagnostics,
        }
    }

    fn discount_or_list(
        &self,
        best_discount: Option<(RuleSource, Decimal)>,
        discount_count: usize,
    ) -> BaseResolution {
        match best_discount {
            Some((source, amount_removed)) => BaseResolution::Discount {
                source,
                amount_removed,
                ignored: discount_count.saturating_sub(1),
            },
            None => BaseResolution::ListPrice,
        }
    }

    /// Prefers the base price already in the target currency; otherwise
    /// converts the first available one. No base price at all degrades to
    /// zero with a warning, pricing must never block order processing.
    fn resolve_base_price(
        &self,
        article: &str,
        base_prices: &[BasePrice],
        target: Currency,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Decimal, bool) {
        if let Some(native) = base_prices.iter().find(|p| p.amount.currency == target) {
            return (native.amount.value, false);
        }

        if let Some(other) = base_prices.first() {
            return (self.converter.convert(other.amount, target).value, false);
        }

        log::warn!("No base price configured for article '{}'", article);
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::MissingBasePrice,
            format!("No base price for article '{}'; defaulting to 0", article),
        ));
        (Decimal::ZERO, true)
    }
}
