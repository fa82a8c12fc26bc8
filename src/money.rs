//! Money
//!
//! Display formatting for raw amounts. Formatting is total: any finite amount can be
//! formatted, and non-finite float input is normalised to zero before it reaches
//! the formatter.

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};

/// Formatting configuration passed to every display helper.
///
/// The currency carries its own symbol, separators and minor-unit exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatConfig {
    currency: &'static Currency,
}

impl FormatConfig {
    /// Create a configuration for the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self { currency }
    }

    /// Create a configuration from an ISO 4217 alpha code (e.g. `"EUR"`).
    ///
    /// Returns `None` when the code is unknown.
    pub fn from_code(code: &str) -> Option<Self> {
        iso::find(code.trim()).map(Self::new)
    }

    /// The configured currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self::new(iso::EUR)
    }
}

/// Converts a float amount into a decimal, mapping `NaN` and infinities to zero.
pub fn sanitize_amount(amount: f64) -> Decimal {
    if amount.is_finite() {
        Decimal::from_f64(amount).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// Formats an amount in the configured currency.
pub fn format_amount(amount: Decimal, config: &FormatConfig) -> String {
    Money::from_decimal(amount, config.currency).to_string()
}

/// Formats a float amount, normalising non-finite input to zero first.
pub fn format_float(amount: f64, config: &FormatConfig) -> String {
    format_amount(sanitize_amount(amount), config)
}

/// Formatted price with an optional struck-through base price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceDisplay {
    /// Formatted amount actually charged.
    pub price: String,

    /// Formatted reference amount, present only when it exceeds `price`.
    pub base_price: Option<String>,

    /// Whole-number percentage dropped from `base_price` to `price`.
    pub discount: Option<u32>,
}

/// Builds the two-amount display used by price tags: the charged amount plus,
/// when a larger base amount is given, the base amount and percentage dropped.
pub fn price_display(
    amount: Decimal,
    base_amount: Option<Decimal>,
    config: &FormatConfig,
) -> PriceDisplay {
    let price = format_amount(amount, config);

    match base_amount {
        Some(base) if base > amount => PriceDisplay {
            price,
            base_price: Some(format_amount(base, config)),
            discount: percent_dropped(base, amount),
        },
        _ => PriceDisplay {
            price,
            base_price: None,
            discount: None,
        },
    }
}

/// Percentage of `base` removed to reach `amount`, rounded half away from zero.
///
/// Returns `None` when `base` is not positive or nothing was removed.
pub fn percent_dropped(base: Decimal, amount: Decimal) -> Option<u32> {
    if base <= Decimal::ZERO {
        return None;
    }

    let percent = base
        .checked_sub(amount)?
        .checked_div(base)?
        .checked_mul(Decimal::ONE_HUNDRED)?;

    if percent <= Decimal::ZERO {
        return None;
    }

    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}
