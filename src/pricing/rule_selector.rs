use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::pricing::pricing_model::{PricingRule, RuleGroup};

/// Picks the single winning rule of one group for a quote, or `None` when no
/// rule is eligible. Rules within a group never stack.
///
/// Tie-break comparator, applied via a stable sort so results do not depend
/// on storage iteration order:
///   1. exact-article match beats an ALL wildcard;
///   2. higher `min_quantity` beats lower (more specific volume tier).
pub fn select_winner<'a>(
    group: &'a RuleGroup,
    article: &str,
    quantity: Decimal,
) -> Option<&'a PricingRule> {
    let mut eligible: Vec<&PricingRule> = group
        .rules
        .iter()
        .filter(|rule| rule.is_eligible(article, quantity))
        .collect();

    eligible.sort_by(|a, b| specificity(a, b));
    eligible.first().copied()
}

fn specificity(a: &PricingRule, b: &PricingRule) -> Ordering {
    // Exact target sorts before wildcard.
    b.target
        .is_exact()
        .cmp(&a.target.is_exact())
        .then_with(|| {
            // Higher volume tier sorts first; an unset tier counts as zero.
            let tier_a = a.min_quantity.unwrap_or(Decimal::ZERO);
            let tier_b = b.min_quantity.unwrap_or(Decimal::ZERO);
            tier_b.cmp(&tier_a)
        })
}
