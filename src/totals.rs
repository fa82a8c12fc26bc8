//! Totals
//!
//! Per-line and per-collection totals with optional percentage tax. Tax applies to
//! the effective unit price (after deal or sale resolution), never the list price.
//!
//! All functions are total: malformed tax input is excluded rather than rejected,
//! and amounts beyond the range of [`Decimal`] saturate at its bounds.

use rust_decimal::Decimal;
use serde_json::Value;
use smallvec::SmallVec;

use crate::{
    lines::Line,
    normalize::{amount, leading_number},
    pricing::effective_unit_price,
};

/// Normalises a backend tax value to a non-negative percentage.
///
/// Accepts numbers and numeric strings (leading-number parse, so `"4%"` reads as
/// `4`). Null, empty, negative or unparseable input yields `None`, which is distinct
/// from an explicit zero tax.
pub fn normalize_tax(raw: &Value) -> Option<Decimal> {
    let parsed = match raw {
        Value::Number(_) => amount(raw),
        Value::String(text) => leading_number(text),
        _ => None,
    }?;

    (parsed >= Decimal::ZERO).then_some(parsed)
}

/// Normalises an already-parsed tax percentage, rejecting negative values.
pub fn normalize_tax_rate(rate: Option<Decimal>) -> Option<Decimal> {
    rate.filter(|rate| *rate >= Decimal::ZERO)
}

/// Totals for one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTotals {
    /// Unit price × quantity.
    pub base_total: Decimal,

    /// Tax on the base total.
    pub tax_total: Decimal,

    /// Base total plus tax.
    pub grand_total: Decimal,

    /// Tax percentage applied; zero when the line is untaxed.
    pub tax_rate: Decimal,
}

/// Computes the totals for a unit price, quantity and optional tax percentage.
///
/// Quantities below one are treated as one. Overflowing products saturate at
/// [`Decimal::MAX`] (or [`Decimal::MIN`] for negative prices).
pub fn compute_line_totals(
    unit_price: Decimal,
    quantity: i64,
    tax_percent: Option<Decimal>,
) -> LineTotals {
    let quantity = Decimal::from(quantity.max(1));

    let tax_rate = match tax_percent {
        Some(rate) if rate > Decimal::ZERO => rate,
        _ => Decimal::ZERO,
    };

    let fraction = tax_rate
        .checked_div(Decimal::ONE_HUNDRED)
        .unwrap_or_default();

    let base_total = unit_price.saturating_mul(quantity);
    let tax_total = unit_price.saturating_mul(fraction).saturating_mul(quantity);

    LineTotals {
        base_total,
        tax_total,
        grand_total: base_total.saturating_add(tax_total),
        tax_rate,
    }
}

/// Computes the totals for a line from its effective unit price.
pub fn line_totals(line: &Line) -> LineTotals {
    compute_line_totals(
        effective_unit_price(&line.pricing),
        i64::from(line.quantity),
        line.tax,
    )
}

/// Sum of base totals, each from the line's effective unit price.
pub fn subtotal_without_tax(lines: &[Line]) -> Decimal {
    saturating_sum(lines.iter().map(|line| line_totals(line).base_total))
}

/// Sum of per-line tax.
pub fn tax_total(lines: &[Line]) -> Decimal {
    saturating_sum(lines.iter().map(|line| line_totals(line).tax_total))
}

/// Sum of per-line grand totals (base plus tax).
pub fn grand_total(lines: &[Line]) -> Decimal {
    saturating_sum(lines.iter().map(|line| line_totals(line).grand_total))
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Total number of units across all lines.
pub fn total_items(lines: &[Line]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

/// Distinct positive tax rates, in first-seen order.
pub fn distinct_tax_rates(lines: &[Line]) -> SmallVec<[Decimal; 4]> {
    let mut rates: SmallVec<[Decimal; 4]> = SmallVec::new();

    for rate in lines.iter().filter_map(|line| line.tax) {
        if rate > Decimal::ZERO && !rates.contains(&rate) {
            rates.push(rate);
        }
    }

    rates
}

/// Label for the tax row: `"Tax (4%)"` when exactly one positive rate is in use and
/// tax is owed, otherwise `"Tax"`.
pub fn tax_label(lines: &[Line], tax_total: Decimal) -> String {
    let rates = distinct_tax_rates(lines);

    match rates.as_slice() {
        [rate] if tax_total > Decimal::ZERO => format!("Tax ({}%)", rate.normalize()),
        _ => "Tax".to_string(),
    }
}
