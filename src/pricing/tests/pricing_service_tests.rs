// End-to-end scenarios for the pricing resolution pipeline, running the
// real service against the in-memory rule store.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::Error;
use crate::fx::fx_model::{Currency, MonetaryAmount};
use crate::pricing::pricing_errors::PricingError;
use crate::pricing::pricing_model::{
    BasePrice, BreakdownKind, DiagnosticCode, PriceQuoteRequest, ProfileRuleRow,
};
use crate::pricing::pricing_service::PricingService;
use crate::pricing::pricing_traits::PricingServiceTrait;
use crate::pricing::tests::fixtures::{
    exception_row, profile, rule_row, InMemoryRuleStore,
};

const ARTICLE: &str = "TSHIRT";

fn store_with_base(value: Decimal, currency: Currency) -> InMemoryRuleStore {
    InMemoryRuleStore {
        base_prices: vec![BasePrice {
            article: ARTICLE.to_string(),
            amount: MonetaryAmount::new(value, currency),
        }],
        exchange_rate: Some("40".to_string()),
        ..Default::default()
    }
}

fn service(store: InMemoryRuleStore) -> PricingService {
    PricingService::new(Arc::new(store))
}

fn request(quantity: Decimal) -> PriceQuoteRequest {
    PriceQuoteRequest::new(ARTICLE, quantity, Currency::Local)
}

fn has_line(result: &crate::pricing::pricing_model::PriceQuoteResult, kind: BreakdownKind) -> bool {
    result.breakdown.iter().any(|line| line.kind == kind)
}

// Scenario 1: base price only, no rules.
#[test]
fn test_base_price_only() {
    let service = service(store_with_base(dec!(100), Currency::Local));
    let result = service.calculate_price(&request(dec!(1))).unwrap();

    assert_eq!(result.unit_price, dec!(100));
    assert_eq!(result.total_price, dec!(100));
    assert_eq!(result.currency, Currency::Local);
    assert!(result.applied_profile_names.is_empty());
    assert!(result.diagnostics.is_empty());
    assert!(has_line(&result, BreakdownKind::BasePrice));
    assert!(has_line(&result, BreakdownKind::Total));
}

// Scenario 2: one global 10% discount.
#[test]
fn test_global_percentage_discount() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("SEASONAL", "Seasonal Promo", true)];
    store.profile_rules = vec![rule_row("SEASONAL", "percentage_discount", "10", "")];

    let result = service(store).calculate_price(&request(dec!(1))).unwrap();
    assert_eq!(result.unit_price, dec!(90));
    assert!(result.applied_profile_names.contains("Seasonal Promo"));
    assert!(has_line(&result, BreakdownKind::Discount));
}

// Scenario 3: a client fixed-price exception beats the discount outcome.
#[test]
fn test_client_exception_fixed_price_suppresses_discount() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("SEASONAL", "Seasonal Promo", true)];
    store.profile_rules = vec![rule_row("SEASONAL", "percentage_discount", "10", "")];
    store
        .client_exceptions
        .insert("ACME".to_string(), vec![exception_row("fixed_price", "80", "LOCAL")]);

    let mut req = request(dec!(1));
    req.client_id = Some("ACME".to_string());

    let result = service(store).calculate_price(&req).unwrap();
    assert_eq!(result.unit_price, dec!(80));
    assert!(result.applied_profile_names.contains("ADHOC"));
    // The discount shows up only as an informational note.
    assert!(has_line(&result, BreakdownKind::SuppressedDiscount));
    assert!(!has_line(&result, BreakdownKind::Discount));
    assert!(!result.applied_profile_names.contains("Seasonal Promo"));
}

// Scenario 4: scenario 3 plus a global fixed surcharge.
#[test]
fn test_surcharge_on_top_of_fixed_price() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![
        profile("SEASONAL", "Seasonal Promo", true),
        profile("RUSHFEE", "Rush Fee", true),
    ];
    store.profile_rules = vec![
        rule_row("SEASONAL", "percentage_discount", "10", ""),
        rule_row("RUSHFEE", "fixed_surcharge", "15", "LOCAL"),
    ];
    store
        .client_exceptions
        .insert("ACME".to_string(), vec![exception_row("fixed_price", "80", "LOCAL")]);

    let mut req = request(dec!(1));
    req.client_id = Some("ACME".to_string());

    let result = service(store).calculate_price(&req).unwrap();
    assert_eq!(result.unit_price, dec!(95));
    assert!(result.applied_profile_names.contains("Rush Fee"));
    assert!(has_line(&result, BreakdownKind::Surcharge));
}

// Scenario 5: USD base price and USD fixed price under rate 40.
#[test]
fn test_usd_amounts_normalized_to_local() {
    let mut store = store_with_base(dec!(10), Currency::Usd);
    store.profiles = vec![profile("EXPORT", "Export", true)];
    store.profile_rules = vec![rule_row("EXPORT", "fixed_price", "5", "USD")];

    let result = service(store).calculate_price(&request(dec!(1))).unwrap();
    // Converted base is 400; the fixed price converts to 200 and wins.
    assert_eq!(result.unit_price, dec!(200));
}

// Scenario 6: a formula rule overrides both discount and fixed price.
#[test]
fn test_formula_overrides_discount_and_fixed_price() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![
        profile("SEASONAL", "Seasonal Promo", true),
        profile("EMBROIDERY", "Embroidery", true),
    ];
    let mut formula = rule_row("EMBROIDERY", "formula", "", "");
    formula.formula_base = Some("50".to_string());
    formula.formula_threshold = Some("5000".to_string());
    formula.formula_step_price = Some("10".to_string());
    formula.formula_step_quantity = Some("1000".to_string());
    store.profile_rules = vec![
        rule_row("SEASONAL", "percentage_discount", "10", ""),
        formula,
    ];
    store
        .client_exceptions
        .insert("ACME".to_string(), vec![exception_row("fixed_price", "70", "LOCAL")]);

    let mut req = request(dec!(1));
    req.client_id = Some("ACME".to_string());
    req.formula_variables
        .insert("stitchCount".to_string(), dec!(8000));

    let result = service(store).calculate_price(&req).unwrap();
    // steps = ceil((8000 - 5000) / 1000) = 3 -> 50 + 3 * 10, even though the
    // fixed price of 70 is cheaper.
    assert_eq!(result.unit_price, dec!(80));
    assert!(has_line(&result, BreakdownKind::Formula));
    assert_eq!(
        result
            .applied_profile_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["Embroidery"]
    );
}

// With several formula rules eligible at once, the first by group
// resolution order wins: client exceptions resolve ahead of global profiles.
#[test]
fn test_first_formula_by_group_resolution_order_wins() {
    let formula_row = |mut row: ProfileRuleRow, base: &str| {
        row.formula_base = Some(base.to_string());
        row.formula_threshold = Some("5000".to_string());
        row.formula_step_price = Some("10".to_string());
        row.formula_step_quantity = Some("1000".to_string());
        row
    };

    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("EMBROIDERY", "Embroidery", true)];
    store.profile_rules = vec![formula_row(rule_row("EMBROIDERY", "formula", "", ""), "999")];
    store.client_exceptions.insert(
        "ACME".to_string(),
        vec![formula_row(exception_row("formula", "", ""), "50")],
    );

    let mut req = request(dec!(1));
    req.client_id = Some("ACME".to_string());
    req.formula_variables
        .insert("stitchCount".to_string(), dec!(8000));

    let result = service(store).calculate_price(&req).unwrap();
    // The ADHOC formula (base 50) wins over the global one (base 999),
    // regardless of their values.
    assert_eq!(result.unit_price, dec!(80));
    assert_eq!(
        result
            .applied_profile_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["ADHOC"]
    );
    assert!(!result.applied_profile_names.contains("Embroidery"));
}

#[test]
fn test_total_is_unit_price_times_quantity() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("SEASONAL", "Seasonal Promo", true)];
    store.profile_rules = vec![rule_row("SEASONAL", "percentage_discount", "10", "")];

    let result = service(store).calculate_price(&request(dec!(7))).unwrap();
    assert_eq!(result.unit_price, dec!(90));
    assert_eq!(result.total_price, dec!(630));
}

#[test]
fn test_largest_of_two_discounts_wins() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![
        profile("A", "Promo A", true),
        profile("B", "Promo B", true),
    ];
    store.profile_rules = vec![
        rule_row("A", "percentage_discount", "5", ""),
        rule_row("B", "percentage_discount", "25", ""),
    ];

    let result = service(store).calculate_price(&request(dec!(1))).unwrap();
    assert_eq!(result.unit_price, dec!(75));
    assert!(result.applied_profile_names.contains("Promo B"));
    assert!(has_line(&result, BreakdownKind::IgnoredDiscounts));
}

#[test]
fn test_result_does_not_depend_on_storage_order() {
    let build = |reversed: bool| {
        let mut store = store_with_base(dec!(100), Currency::Local);
        let mut profiles = vec![
            profile("A", "Promo A", true),
            profile("B", "Promo B", true),
        ];
        let mut rules = vec![
            rule_row("A", "percentage_discount", "5", ""),
            rule_row("B", "percentage_discount", "25", ""),
        ];
        if reversed {
            profiles.reverse();
            rules.reverse();
        }
        store.profiles = profiles;
        store.profile_rules = rules;
        service(store).calculate_price(&request(dec!(1))).unwrap()
    };

    let forward = build(false);
    let backward = build(true);
    assert_eq!(forward.unit_price, backward.unit_price);
    assert_eq!(forward.applied_profile_names, backward.applied_profile_names);
}

#[test]
fn test_volume_tiers_within_one_profile() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("VOLUME", "Volume", true)];
    let mut tiered = rule_row("VOLUME", "percentage_discount", "20", "");
    tiered.min_quantity = Some("50".to_string());
    store.profile_rules = vec![
        rule_row("VOLUME", "percentage_discount", "10", ""),
        tiered,
    ];

    let small = service(store.clone()).calculate_price(&request(dec!(10))).unwrap();
    assert_eq!(small.unit_price, dec!(90));

    let large = service(store).calculate_price(&request(dec!(100))).unwrap();
    assert_eq!(large.unit_price, dec!(80));
}

#[test]
fn test_malformed_rule_dropped_with_diagnostic() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![
        profile("GOOD", "Good", true),
        profile("BAD", "Bad", true),
    ];
    store.profile_rules = vec![
        rule_row("GOOD", "percentage_discount", "10", ""),
        rule_row("BAD", "percentage_discount", "ten percent", ""),
    ];

    let result = service(store).calculate_price(&request(dec!(1))).unwrap();
    assert_eq!(result.unit_price, dec!(90));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::MalformedRule);
    assert!(!result.applied_profile_names.contains("Bad"));
}

#[test]
fn test_extra_profile_ids_are_caller_asserted_flags() {
    let mut store = store_with_base(dec!(100), Currency::Local);
    store.profiles = vec![profile("URGENT", "Urgent", false)];
    store.profile_rules = vec![rule_row("URGENT", "percentage_surcharge", "10", "")];

    let plain = service(store.clone()).calculate_price(&request(dec!(1))).unwrap();
    assert_eq!(plain.unit_price, dec!(100));

    let mut req = request(dec!(1));
    req.extra_profile_ids = vec!["URGENT".to_string()];
    let urgent = service(store).calculate_price(&req).unwrap();
    assert_eq!(urgent.unit_price, dec!(110));
    assert!(urgent.applied_profile_names.contains("Urgent"));
}

#[test]
fn test_missing_exchange_rate_falls_back() {
    let mut store = store_with_base(dec!(10), Currency::Usd);
    store.exchange_rate = None;

    let result = service(store).calculate_price(&request(dec!(1))).unwrap();
    // Fallback rate is 40 LOCAL per USD.
    assert_eq!(result.unit_price, dec!(400));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].code,
        DiagnosticCode::MissingExchangeRate
    );
}

#[test]
fn test_exchange_rate_override_wins_over_store() {
    let mut store = store_with_base(dec!(10), Currency::Usd);
    store.exchange_rate = Some("40".to_string());

    let mut req = request(dec!(1));
    req.exchange_rate_override = Some(dec!(50));

    let result = service(store).calculate_price(&req).unwrap();
    assert_eq!(result.unit_price, dec!(500));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_non_positive_override_is_rejected() {
    let service = service(store_with_base(dec!(100), Currency::Local));
    let mut req = request(dec!(1));
    req.exchange_rate_override = Some(Decimal::ZERO);
    assert!(service.calculate_price(&req).is_err());
}

#[test]
fn test_negative_quantity_fails_fast() {
    let service = service(store_with_base(dec!(100), Currency::Local));
    let err = service.calculate_price(&request(dec!(-1))).unwrap_err();
    assert!(matches!(
        err,
        Error::Pricing(PricingError::InvalidQuantity(_))
    ));
}

#[test]
fn test_missing_base_price_prices_at_zero_with_warning() {
    let store = InMemoryRuleStore {
        exchange_rate: Some("40".to_string()),
        ..Default::default()
    };

    let result = service(store).calculate_price(&request(dec!(3))).unwrap();
    assert_eq!(result.unit_price, Decimal::ZERO);
    assert_eq!(result.total_price, Decimal::ZERO);
    assert!(has_line(&result, BreakdownKind::MissingBasePrice));
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::MissingBasePrice);
}

#[test]
fn test_batch_uses_one_rate_snapshot() {
    let mut store = InMemoryRuleStore {
        exchange_rate: None,
        ..Default::default()
    };
    store.base_prices = vec![
        BasePrice {
            article: "TSHIRT".to_string(),
            amount: MonetaryAmount::usd(dec!(10)),
        },
        BasePrice {
            article: "MUG".to_string(),
            amount: MonetaryAmount::usd(dec!(2)),
        },
    ];

    let requests = vec![
        PriceQuoteRequest::new("TSHIRT", dec!(1), Currency::Local),
        PriceQuoteRequest::new("MUG", dec!(1), Currency::Local),
    ];

    let results = service(store).calculate_price_batch(&requests).unwrap();
    assert_eq!(results.len(), 2);
    // Both priced under the same fallback snapshot of 40.
    assert_eq!(results[0].unit_price, dec!(400));
    assert_eq!(results[1].unit_price, dec!(80));
    for result in &results {
        assert_eq!(
            result.diagnostics[0].code,
            DiagnosticCode::MissingExchangeRate
        );
    }
}

#[test]
fn test_quote_result_serializes_camel_case() {
    let service = service(store_with_base(dec!(100), Currency::Local));
    let result = service.calculate_price(&request(dec!(1))).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("unitPrice").is_some());
    assert!(json.get("appliedProfileNames").is_some());
    assert!(json.get("breakdown").is_some());
}

#[test]
fn test_formula_variables_map_roundtrip() {
    // Request deserializes from the caller's JSON shape.
    let json = r#"{
        "article": "TSHIRT",
        "quantity": 2,
        "clientId": "ACME",
        "formulaVariables": { "stitchCount": 8000 },
        "targetCurrency": "LOCAL",
        "exchangeRateOverride": null
    }"#;
    let req: PriceQuoteRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.quantity, dec!(2));
    assert_eq!(
        req.formula_variables,
        HashMap::from([("stitchCount".to_string(), dec!(8000))])
    );
    assert!(req.extra_profile_ids.is_empty());
}
