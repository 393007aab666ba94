use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::pricing::calculator::{BaseResolution, QuoteOutcome};
use crate::pricing::pricing_model::{BreakdownKind, BreakdownLine, PriceQuoteResult};

/// Builds the ordered, human-auditable explanation of a quote and the set of
/// sources that actually influenced the price. Purely derivative of the
/// calculator's intermediate values.
pub fn record(outcome: QuoteOutcome) -> PriceQuoteResult {
    let mut breakdown: Vec<BreakdownLine> = Vec::new();
    let mut applied: BTreeSet<String> = BTreeSet::new();

    if outcome.base_price_missing {
        breakdown.push(BreakdownLine {
            kind: BreakdownKind::MissingBasePrice,
            amount: Decimal::ZERO,
            description: format!(
                "No base price for article '{}'; defaulting to 0",
                outcome.article
            ),
            source_profile: None,
        });
    } else {
        breakdown.push(BreakdownLine {
            kind: BreakdownKind::BasePrice,
            amount: outcome.base_price,
            description: format!("List price for article '{}'", outcome.article),
            source_profile: None,
        });
    }

    match &outcome.resolution {
        BaseResolution::ListPrice => {}
        BaseResolution::Discount {
            source,
            amount_removed,
            ignored,
        } => {
            applied.insert(source.name().to_string());
            breakdown.push(BreakdownLine {
                kind: BreakdownKind::Discount,
                amount: -*amount_removed,
                description: format!("Discount from '{}'", source.name()),
                source_profile: Some(source.name().to_string()),
            });
            push_ignored(&mut breakdown, *ignored);
        }
        BaseResolution::FixedPrice {
            source,
            price,
            suppressed_discount,
            ignored_discounts,
        } => {
            applied.insert(source.name().to_string());
            breakdown.push(BreakdownLine {
                kind: BreakdownKind::FixedPrice,
                amount: *price,
                description: format!("Fixed price from '{}'", source.name()),
                source_profile: Some(source.name().to_string()),
            });
            if let Some((discount_source, removed)) = suppressed_discount {
                // Informational only; the discount was not subtracted.
                breakdown.push(BreakdownLine {
                    kind: BreakdownKind::SuppressedDiscount,
                    amount: Decimal::ZERO,
                    description: format!(
                        "Discount of {} from '{}' suppressed by cheaper fixed price",
                        removed,
                        discount_source.name()
                    ),
                    source_profile: Some(discount_source.name().to_string()),
                });
            }
            push_ignored(&mut breakdown, *ignored_discounts);
        }
        BaseResolution::Formula {
            source,
            value,
            variable,
            variable_value,
        } => {
            applied.insert(source.name().to_string());
            breakdown.push(BreakdownLine {
                kind: BreakdownKind::Formula,
                amount: *value,
                description: format!(
                    "Tiered formula price from '{}' ({} = {}), overrides other rules",
                    source.name(),
                    variable,
                    variable_value
                ),
                source_profile: Some(source.name().to_string()),
            });
        }
    }

    for surcharge in &outcome.surcharges {
        applied.insert(surcharge.source.name().to_string());
        let description = match surcharge.percent {
            Some(percent) => format!(
                "Surcharge of {}% from '{}'",
                percent,
                surcharge.source.name()
            ),
            None => format!("Surcharge from '{}'", surcharge.source.name()),
        };
        breakdown.push(BreakdownLine {
            kind: BreakdownKind::Surcharge,
            amount: surcharge.amount,
            description,
            source_profile: Some(surcharge.source.name().to_string()),
        });
    }

    breakdown.push(BreakdownLine {
        kind: BreakdownKind::Total,
        amount: outcome.total_price,
        description: format!(
            "Total for {} x {} at {} {}",
            outcome.quantity, outcome.article, outcome.unit_price, outcome.currency
        ),
        source_profile: None,
    });

    PriceQuoteResult {
        unit_price: outcome.unit_price,
        total_price: outcome.total_price,
        currency: outcome.currency,
        breakdown,
        applied_profile_names: applied,
        diagnostics: outcome.diagnostics,
    }
}

fn push_ignored(breakdown: &mut Vec<BreakdownLine>, ignored: usize) {
    if ignored > 0 {
        breakdown.push(BreakdownLine {
            kind: BreakdownKind::IgnoredDiscounts,
            amount: Decimal::ZERO,
            description: format!("{} lesser discounts ignored", ignored),
            source_profile: None,
        });
    }
}
