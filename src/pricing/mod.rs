pub mod breakdown;
pub mod calculator;
pub mod pricing_errors;
pub mod pricing_model;
pub mod pricing_service;
pub mod pricing_traits;
pub mod profile_resolver;
pub mod rule_selector;

// Re-export the main public entry points and types
pub use calculator::{AppliedSurcharge, BaseResolution, PriceCalculator, QuoteOutcome};
pub use pricing_errors::PricingError;
pub use pricing_model::{
    ArticleTarget, BasePrice, BreakdownKind, BreakdownLine, Diagnostic, DiagnosticCode,
    FormulaRule, PriceQuoteRequest, PriceQuoteResult, PricingRule, Profile, ProfileRuleRow,
    RuleGroup, RuleKind, RuleSource,
};
pub use pricing_service::PricingService;
pub use pricing_traits::{PricingServiceTrait, RuleStoreTrait};

#[cfg(test)]
pub(crate) mod tests;
