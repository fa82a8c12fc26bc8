//! Checkout summary
//!
//! Formatted breakdown of a cart, buy-now session or placed order, and a table
//! renderer for terminals.

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    aggregate::{Aggregate, Coupon, DiscountType},
    lines::Line,
    money::{FormatConfig, format_amount},
    orders::Order,
};

/// Errors that can occur when rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Writing to the output failed.
    #[error("failed to write summary")]
    Io(#[from] io::Error),
}

/// Display-ready values for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDisplay {
    /// Line name.
    pub name: String,

    /// Units.
    pub quantity: u32,

    /// Effective unit price.
    pub unit_price: String,

    /// Struck-through reference unit price.
    pub base_price: Option<String>,

    /// Discount badge percentage.
    pub discount: Option<u32>,

    /// Line total, preferring the backend's `itemTotal`.
    pub total: String,

    /// Tax note such as `"Includes 4% tax"`.
    pub tax_note: Option<String>,
}

impl LineDisplay {
    /// Format a line.
    pub fn new(line: &Line, config: &FormatConfig) -> Self {
        let display = line.resolved_price().display(config);

        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: display.price,
            base_price: display.base_price,
            discount: display.discount,
            total: format_amount(line.display_total(), config),
            tax_note: line
                .tax
                .filter(|rate| *rate > Decimal::ZERO)
                .map(|rate| format!("Includes {}% tax", rate.normalize())),
        }
    }
}

/// Display-ready checkout breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    /// Per-line values, in display order.
    pub lines: Vec<LineDisplay>,

    /// Subtotal without tax.
    pub subtotal: String,

    /// Label for the tax row.
    pub tax_label: String,

    /// Tax amount, absent when no tax is owed.
    pub tax: Option<String>,

    /// Coupon code and value, e.g. `"SAVE10 (10%)"`.
    pub coupon: Option<String>,

    /// Discount amount, absent when nothing is discounted.
    pub discount: Option<String>,

    /// Shipping fee, absent when shipping is free.
    pub shipping: Option<String>,

    /// Cash-on-delivery fee, absent when there is none.
    pub cod_fee: Option<String>,

    /// Amount payable.
    pub total: String,
}

impl CheckoutSummary {
    /// Summarise a cart or buy-now aggregate.
    pub fn from_aggregate(aggregate: &Aggregate, config: &FormatConfig) -> Self {
        Amounts {
            lines: aggregate.lines(),
            subtotal: aggregate.subtotal_without_tax(),
            tax: aggregate.tax_total(),
            tax_label: aggregate.tax_label(),
            coupon: aggregate.coupon(),
            discount: aggregate.discount(),
            shipping: aggregate.shipping_fee(),
            cod_fee: aggregate.cod_fee(),
            total: aggregate.final_total(),
        }
        .format(config)
    }

    /// Summarise a placed order. The order's recorded total is payable.
    pub fn from_order(order: &Order, config: &FormatConfig) -> Self {
        Amounts {
            lines: &order.lines,
            subtotal: order.subtotal_without_tax(),
            tax: order.tax_total(),
            tax_label: order.tax_label(),
            coupon: order.coupon.as_ref(),
            discount: order.discount,
            shipping: order.shipping_fee,
            cod_fee: order.cod_fee,
            total: order.total_amount,
        }
        .format(config)
    }

    /// Render the line table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Price", "Was", "Total"]);

        for line in &self.lines {
            let name = match &line.tax_note {
                Some(note) => format!("{}\n{note}", line.name),
                None => line.name.clone(),
            };

            let was = match (&line.base_price, line.discount) {
                (Some(base), Some(percent)) => format!("{base} (-{percent}%)"),
                (Some(base), None) => base.clone(),
                _ => String::new(),
            };

            builder.push_record([
                name,
                line.quantity.to_string(),
                line.unit_price.clone(),
                was,
                line.total.clone(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..5), Alignment::right());

        writeln!(out, "{table}")?;

        for (label, value) in self.rows() {
            writeln!(out, "{label:>16}  {value}")?;
        }

        Ok(())
    }

    /// Label and value of every totals row that applies, in display order.
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![("Subtotal".to_string(), self.subtotal.clone())];

        if let Some(tax) = &self.tax {
            rows.push((self.tax_label.clone(), tax.clone()));
        }

        if let Some(coupon) = &self.coupon {
            rows.push(("Coupon".to_string(), coupon.clone()));
        }

        if let Some(discount) = &self.discount {
            rows.push(("Discount".to_string(), format!("- {discount}")));
        }

        rows.push((
            "Shipping".to_string(),
            self.shipping
                .as_ref()
                .map_or_else(|| "Free".to_string(), |fee| format!("+ {fee}")),
        ));

        if let Some(cod_fee) = &self.cod_fee {
            rows.push(("COD Fee".to_string(), format!("+ {cod_fee}")));
        }

        rows.push(("Total".to_string(), self.total.clone()));

        rows
    }
}

/// Describe a coupon's value: `"10%"` or a formatted fixed amount.
pub fn coupon_value(coupon: &Coupon, config: &FormatConfig) -> String {
    match coupon.discount_type {
        DiscountType::Percentage => format!("{}%", coupon.discount_value.normalize()),
        DiscountType::Fixed => format_amount(coupon.discount_value, config),
    }
}

struct Amounts<'a> {
    lines: &'a [Line],
    subtotal: Decimal,
    tax: Decimal,
    tax_label: String,
    coupon: Option<&'a Coupon>,
    discount: Decimal,
    shipping: Decimal,
    cod_fee: Decimal,
    total: Decimal,
}

impl Amounts<'_> {
    fn format(self, config: &FormatConfig) -> CheckoutSummary {
        let positive = |amount: Decimal| {
            (amount > Decimal::ZERO).then(|| format_amount(amount, config))
        };

        CheckoutSummary {
            lines: self
                .lines
                .iter()
                .map(|line| LineDisplay::new(line, config))
                .collect(),
            subtotal: format_amount(self.subtotal, config),
            tax_label: self.tax_label,
            tax: positive(self.tax),
            coupon: self
                .coupon
                .map(|coupon| format!("{} ({})", coupon.code, coupon_value(coupon, config))),
            discount: positive(self.discount),
            shipping: positive(self.shipping),
            cod_fee: positive(self.cod_fee),
            total: format_amount(self.total, config),
        }
    }
}
