use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::constants::{ADHOC_SOURCE_NAME, DEFAULT_FORMULA_VARIABLE};
use crate::fx::fx_model::{Currency, MonetaryAmount};

/// A named, reusable bundle of pricing rules, either globally active or
/// assignable to specific clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub is_global: bool,
}

/// Base (list) price of an article in one currency. At most one per
/// (article, currency) pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasePrice {
    pub article: String,
    pub amount: MonetaryAmount,
}

/// Raw rule row as the rule store hands it over.
///
/// Numeric columns are strings because the legacy store is loosely typed;
/// per-row validation into [`PricingRule`] is an explicit pipeline step and
/// a malformed row is dropped with a [`Diagnostic`], never a hard error.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRuleRow {
    /// Owning profile; `None` for client ad-hoc exception rows.
    pub profile_id: Option<String>,
    pub rule_kind: String,
    pub value: String,
    pub currency: String,
    /// `None` means the rule targets every article (ALL).
    pub target_article: Option<String>,
    pub min_quantity: Option<String>,
    pub formula_base: Option<String>,
    pub formula_threshold: Option<String>,
    pub formula_step_price: Option<String>,
    pub formula_step_quantity: Option<String>,
    pub formula_cap: Option<String>,
    pub formula_variable: Option<String>,
}

/// Which configuration source a rule came from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RuleSource {
    Profile { id: String, name: String },
    Adhoc,
}

impl RuleSource {
    pub fn name(&self) -> &str {
        match self {
            RuleSource::Profile { name, .. } => name,
            RuleSource::Adhoc => ADHOC_SOURCE_NAME,
        }
    }
}

/// Article scope of a rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ArticleTarget {
    Article(String),
    All,
}

impl ArticleTarget {
    pub fn matches(&self, article: &str) -> bool {
        match self {
            ArticleTarget::Article(a) => a == article,
            ArticleTarget::All => true,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, ArticleTarget::Article(_))
    }
}

/// Parameters of a quantity/variable-tiered formula rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormulaRule {
    pub base: Decimal,
    pub threshold: Decimal,
    pub step_price: Decimal,
    pub step_quantity: Decimal,
    pub cap: Option<Decimal>,
    /// Name of the request variable the formula reads (e.g. stitch count).
    pub variable: String,
}

impl FormulaRule {
    /// `base + ceil(max(0, min(variable, cap) − threshold) / step_quantity) × step_price`
    pub fn evaluate(&self, variable: Decimal) -> Decimal {
        let capped = match self.cap {
            Some(cap) => variable.min(cap),
            None => variable,
        };
        let over = (capped - self.threshold).max(Decimal::ZERO);
        let steps = (over / self.step_quantity).ceil();
        self.base + steps * self.step_price
    }
}

/// Closed set of rule kinds, validated out of the string-tagged rows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RuleKind {
    PercentageDiscount { percent: Decimal },
    FixedSubtract { amount: MonetaryAmount },
    FixedPrice { price: MonetaryAmount },
    PercentageSurcharge { percent: Decimal },
    FixedSurcharge { amount: MonetaryAmount },
    Formula(FormulaRule),
}

impl RuleKind {
    pub fn is_discount(&self) -> bool {
        matches!(
            self,
            RuleKind::PercentageDiscount { .. } | RuleKind::FixedSubtract { .. }
        )
    }

    pub fn is_surcharge(&self) -> bool {
        matches!(
            self,
            RuleKind::PercentageSurcharge { .. } | RuleKind::FixedSurcharge { .. }
        )
    }
}

/// A validated pricing rule attributed to its source group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub source: RuleSource,
    pub target: ArticleTarget,
    pub min_quantity: Option<Decimal>,
    pub kind: RuleKind,
}

impl PricingRule {
    /// Validates one raw row into a rule. The error string feeds a
    /// `MalformedRule` diagnostic; the row is dropped, never fatal.
    pub fn from_row(row: &ProfileRuleRow, source: RuleSource) -> Result<PricingRule, String> {
        let target = match row.target_article.as_deref() {
            Some(article) if !article.trim().is_empty() => {
                ArticleTarget::Article(article.trim().to_string())
            }
            _ => ArticleTarget::All,
        };

        let min_quantity = match row.min_quantity.as_deref() {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let qty = raw
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| format!("unparsable minQuantity '{}'", raw))?;
                if qty < Decimal::ZERO {
                    return Err(format!("negative minQuantity '{}'", raw));
                }
                Some(qty)
            }
        };

        let kind = match row.rule_kind.trim() {
            "percentage_discount" => RuleKind::PercentageDiscount {
                percent: parse_value(row)?,
            },
            "fixed_subtract" => RuleKind::FixedSubtract {
                amount: parse_amount(row)?,
            },
            "fixed_price" => RuleKind::FixedPrice {
                price: parse_amount(row)?,
            },
            "percentage_surcharge" => RuleKind::PercentageSurcharge {
                percent: parse_value(row)?,
            },
            "fixed_surcharge" => RuleKind::FixedSurcharge {
                amount: parse_amount(row)?,
            },
            "formula" => RuleKind::Formula(parse_formula(row)?),
            other => return Err(format!("unknown ruleKind '{}'", other)),
        };

        Ok(PricingRule {
            source,
            target,
            min_quantity,
            kind,
        })
    }

    /// Eligibility per quote: article exact-or-ALL match and quantity at or
    /// above the rule's volume tier.
    pub fn is_eligible(&self, article: &str, quantity: Decimal) -> bool {
        if !self.target.matches(article) {
            return false;
        }
        match self.min_quantity {
            Some(min) => quantity >= min,
            None => true,
        }
    }
}

fn parse_value(row: &ProfileRuleRow) -> Result<Decimal, String> {
    row.value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| format!("unparsable value '{}'", row.value))
}

fn parse_amount(row: &ProfileRuleRow) -> Result<MonetaryAmount, String> {
    let value = parse_value(row)?;
    let currency = Currency::from_code(&row.currency)
        .ok_or_else(|| format!("unknown currency '{}'", row.currency))?;
    Ok(MonetaryAmount::new(value, currency))
}

fn parse_formula(row: &ProfileRuleRow) -> Result<FormulaRule, String> {
    let field = |name: &str, raw: &Option<String>| -> Result<Decimal, String> {
        raw.as_deref()
            .ok_or_else(|| format!("missing formula field '{}'", name))?
            .trim()
            .parse::<Decimal>()
            .map_err(|_| format!("unparsable formula field '{}'", name))
    };

    let step_quantity = field("stepQuantity", &row.formula_step_quantity)?;
    if step_quantity <= Decimal::ZERO {
        return Err(format!("non-positive formula stepQuantity '{}'", step_quantity));
    }

    let cap = match row.formula_cap.as_deref() {
        None => None,
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<Decimal>()
                .map_err(|_| format!("unparsable formula cap '{}'", raw))?,
        ),
    };

    Ok(FormulaRule {
        base: field("base", &row.formula_base)?,
        threshold: field("threshold", &row.formula_threshold)?,
        step_price: field("stepPrice", &row.formula_step_price)?,
        step_quantity,
        cap,
        variable: row
            .formula_variable
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FORMULA_VARIABLE.to_string()),
    })
}

/// One candidate rule group for a quote: a resolved profile or the ADHOC
/// pseudo-profile. Groups are kept in resolution order.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    pub source: RuleSource,
    pub rules: Vec<PricingRule>,
}

/// Input of one price quote computation.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuoteRequest {
    pub article: String,
    pub quantity: Decimal,
    pub client_id: Option<String>,
    #[serde(default)]
    pub extra_profile_ids: Vec<String>,
    #[serde(default)]
    pub formula_variables: HashMap<String, Decimal>,
    pub target_currency: Currency,
    /// Replaces the store's exchange rate for this single call (batch
    /// callers price many articles under one consistent rate).
    pub exchange_rate_override: Option<Decimal>,
}

impl PriceQuoteRequest {
    pub fn new(article: &str, quantity: Decimal, target_currency: Currency) -> Self {
        PriceQuoteRequest {
            article: article.to_string(),
            quantity,
            client_id: None,
            extra_profile_ids: Vec::new(),
            formula_variables: HashMap::new(),
            target_currency,
            exchange_rate_override: None,
        }
    }
}

/// Kinds of breakdown line items, in the order they appear.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BreakdownKind {
    BasePrice,
    MissingBasePrice,
    Discount,
    SuppressedDiscount,
    IgnoredDiscounts,
    FixedPrice,
    Formula,
    Surcharge,
    Total,
}

/// One human-readable line of the price explanation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownLine {
    pub kind: BreakdownKind,
    pub amount: Decimal,
    pub description: String,
    pub source_profile: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCode {
    MalformedRule,
    MissingBasePrice,
    MissingExchangeRate,
}

/// A non-fatal data problem encountered while computing a quote, collected
/// alongside the result instead of aborting the pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
        }
    }
}

/// Output of one price quote computation.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuoteResult {
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub currency: Currency,
    pub breakdown: Vec<BreakdownLine>,
    /// Sources whose rules actually influenced the final price.
    pub applied_profile_names: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}
