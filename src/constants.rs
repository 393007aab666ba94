use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fallback exchange rate (LOCAL per USD) used when the configured value is
/// absent or unparsable.
pub const DEFAULT_LOCAL_PER_USD: Decimal = dec!(40);

/// Source name reported for client ad-hoc exception rules
pub const ADHOC_SOURCE_NAME: &str = "ADHOC";

/// Decimal precision for price calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Variable name a formula rule reads from the request when the stored row
/// does not name one (embroidery stitch count by shop convention)
pub const DEFAULT_FORMULA_VARIABLE: &str = "stitchCount";
