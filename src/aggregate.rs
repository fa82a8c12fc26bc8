//! Aggregate
//!
//! The cart-like container of lines plus coupon, shipping and payment modifiers.
//! Derived fields are always recomputed from scratch in [`Aggregate::set`], so they
//! are a pure function of the current lines and modifiers.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    lines::Line,
    normalize::{amount_field, field, text_field},
    totals,
};

pub mod store;

/// How a coupon's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage of the order.
    Percentage,

    /// Fixed currency amount.
    Fixed,
}

/// A coupon applied by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    /// Backend identifier.
    pub id: Option<String>,

    /// Code the customer entered.
    pub code: String,

    /// Percentage or fixed.
    pub discount_type: DiscountType,

    /// Percentage points or currency amount, depending on `discount_type`.
    pub discount_value: Decimal,

    /// Expiry as sent by the backend.
    pub expiry: Option<String>,
}

impl Coupon {
    /// Normalise a backend coupon object. Returns `None` without a code.
    pub fn from_json(value: &Value) -> Option<Self> {
        let discount_type = match text_field(value, &["discountType", "discount_type", "type"]) {
            Some(kind) if kind.eq_ignore_ascii_case("percentage") => DiscountType::Percentage,
            _ => DiscountType::Fixed,
        };

        Some(Self {
            id: text_field(value, &["_id", "id"]),
            code: text_field(value, &["code"])?,
            discount_type,
            discount_value: amount_field(value, &["discountValue", "discount_value", "value"])
                .unwrap_or_default(),
            expiry: text_field(value, &["expiry", "expiresAt"]),
        })
    }
}

/// Delivery speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    /// Default delivery.
    #[default]
    Standard,

    /// Expedited delivery.
    Express,
}

impl ShippingMethod {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
        }
    }

    /// Parse a wire name, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(ShippingMethod::Standard),
            "express" => Some(ShippingMethod::Express),
            _ => None,
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card payment.
    Stripe,

    /// Apple Pay, seen on historic orders.
    #[serde(rename = "applepay")]
    ApplePay,

    /// Cash on delivery, which may carry a fee.
    Cod,
}

impl PaymentMethod {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "stripe",
            PaymentMethod::ApplePay => "applepay",
            PaymentMethod::Cod => "cod",
        }
    }

    /// Parse a wire name, case-insensitively (`"COD"` and `"cod"` are the same).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "stripe" | "card" => Some(PaymentMethod::Stripe),
            "applepay" => Some(PaymentMethod::ApplePay),
            "cod" => Some(PaymentMethod::Cod),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalised backend cart or buy-now snapshot, ready for [`Aggregate::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSnapshot {
    /// Lines in display order, unique by id.
    pub lines: Vec<Line>,

    /// Absolute discount from the applied coupon.
    pub discount: Decimal,

    /// Applied coupon.
    pub coupon: Option<Coupon>,

    /// Authoritative final total, when the backend supplies one.
    pub final_total: Option<Decimal>,

    /// Shipping fee.
    pub shipping_fee: Decimal,

    /// Shipping method.
    pub shipping_method: Option<ShippingMethod>,

    /// Cash-on-delivery fee.
    pub cod_fee: Decimal,

    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
}

impl AggregateSnapshot {
    /// Normalise a backend snapshot object.
    ///
    /// Lines without an identifier are dropped and duplicate ids are merged. A
    /// missing or unknown shipping method stays unset, as after a reset.
    pub fn from_json(value: &Value) -> Self {
        let mut merged: Vec<Line> = Vec::new();

        for line in value
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Line::from_json)
        {
            match merged.iter_mut().find(|existing| existing.id == line.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                    // a backend total covers one row only
                    existing.item_total = None;
                    existing.refresh_totals();
                }
                None => merged.push(line),
            }
        }

        Self {
            lines: merged,
            discount: amount_field(value, &["discount"]).unwrap_or_default(),
            coupon: field(value, &["coupon"]).and_then(Coupon::from_json),
            final_total: amount_field(value, &["finalTotal", "final_total"]),
            shipping_fee: amount_field(value, &["shippingFee", "shipping_fee"]).unwrap_or_default(),
            shipping_method: text_field(value, &["shippingMethod", "shipping_method"])
                .and_then(|method| ShippingMethod::parse(&method)),
            cod_fee: amount_field(value, &["codFee", "cod_fee"]).unwrap_or_default(),
            payment_method: text_field(value, &["paymentMethod", "payment_method"])
                .and_then(|method| PaymentMethod::parse(&method)),
        }
    }
}

/// Lines plus modifiers and derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    lines: Vec<Line>,
    discount: Decimal,
    coupon: Option<Coupon>,
    shipping_fee: Decimal,
    shipping_method: Option<ShippingMethod>,
    cod_fee: Decimal,
    payment_method: Option<PaymentMethod>,
    total: Decimal,
    final_total: Decimal,
    total_items: u64,
}

impl Aggregate {
    /// An empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole aggregate and recompute every derived field.
    pub fn set(&mut self, snapshot: AggregateSnapshot) {
        let AggregateSnapshot {
            mut lines,
            discount,
            coupon,
            final_total,
            shipping_fee,
            shipping_method,
            cod_fee,
            payment_method,
        } = snapshot;

        for line in &mut lines {
            line.refresh_totals();
        }

        let total = totals::grand_total(&lines);

        *self = Self {
            total_items: totals::total_items(&lines),
            final_total: final_total.unwrap_or_else(|| {
                total
                    .saturating_sub(discount)
                    .saturating_add(shipping_fee)
                    .saturating_add(cod_fee)
            }),
            total,
            lines,
            discount,
            coupon,
            shipping_fee,
            shipping_method,
            cod_fee,
            payment_method,
        };
    }

    /// Return to the empty state with every modifier cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Optimistically select a payment method without touching anything else.
    pub fn set_payment_method(&mut self, method: Option<PaymentMethod>) {
        self.payment_method = method;
    }

    /// Lines in display order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units across all lines.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Number of distinct lines.
    pub fn total_unique_items(&self) -> usize {
        self.lines.len()
    }

    /// Sum of per-line grand totals, before discount and fees.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Amount payable.
    pub fn final_total(&self) -> Decimal {
        self.final_total
    }

    /// Absolute coupon discount.
    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Applied coupon.
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Shipping fee.
    pub fn shipping_fee(&self) -> Decimal {
        self.shipping_fee
    }

    /// Shipping method.
    pub fn shipping_method(&self) -> Option<ShippingMethod> {
        self.shipping_method
    }

    /// Cash-on-delivery fee.
    pub fn cod_fee(&self) -> Decimal {
        self.cod_fee
    }

    /// Payment method.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Sum of per-line base totals.
    pub fn subtotal_without_tax(&self) -> Decimal {
        totals::subtotal_without_tax(&self.lines)
    }

    /// Sum of per-line tax.
    pub fn tax_total(&self) -> Decimal {
        totals::tax_total(&self.lines)
    }

    /// Label for the tax row.
    pub fn tax_label(&self) -> String {
        totals::tax_label(&self.lines, self.tax_total())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot() -> Value {
        json!({
            "items": [
                { "productId": "p-1", "price": 25, "quantity": 3, "tax": "4" },
                { "productId": "p-2", "variantId": "v-1", "price": 10, "quantity": 1 }
            ],
            "discount": 5,
            "coupon": { "code": "SAVE5", "discountType": "fixed", "discountValue": 5 },
            "shippingFee": 4,
            "codFee": 2,
            "paymentMethod": "COD"
        })
    }

    #[test]
    fn set_derives_totals() {
        let mut aggregate = Aggregate::new();

        aggregate.set(AggregateSnapshot::from_json(&snapshot()));

        assert!(!aggregate.is_empty());
        assert_eq!(aggregate.total_items(), 4);
        assert_eq!(aggregate.total_unique_items(), 2);
        assert_eq!(aggregate.total(), Decimal::from(88));
        assert_eq!(aggregate.subtotal_without_tax(), Decimal::from(85));
        assert_eq!(aggregate.tax_total(), Decimal::from(3));
        assert_eq!(aggregate.final_total(), Decimal::from(89));
        assert_eq!(aggregate.tax_label(), "Tax (4%)");
        assert_eq!(aggregate.shipping_method(), None);
        assert_eq!(aggregate.payment_method(), Some(PaymentMethod::Cod));
        assert_eq!(aggregate.coupon().map(|c| c.code.as_str()), Some("SAVE5"));
    }

    #[test]
    fn backend_final_total_is_authoritative() {
        let mut value = snapshot();
        value["finalTotal"] = json!(70);

        let mut aggregate = Aggregate::new();
        aggregate.set(AggregateSnapshot::from_json(&value));

        assert_eq!(aggregate.final_total(), Decimal::from(70));
        assert_eq!(aggregate.total(), Decimal::from(88));
    }

    #[test]
    fn shipping_method_is_unset_unless_sent() {
        let mut value = snapshot();

        assert_eq!(AggregateSnapshot::from_json(&value).shipping_method, None);

        value["shippingMethod"] = json!("Standard");
        assert_eq!(
            AggregateSnapshot::from_json(&value).shipping_method,
            Some(ShippingMethod::Standard)
        );

        value["shippingMethod"] = json!("drone");
        assert_eq!(AggregateSnapshot::from_json(&value).shipping_method, None);

        let mut aggregate = Aggregate::new();
        aggregate.set(AggregateSnapshot::from_json(&snapshot()));
        let from_snapshot = aggregate.shipping_method();
        aggregate.reset();

        assert_eq!(from_snapshot, aggregate.shipping_method());
    }

    #[test]
    fn overflowing_amounts_saturate() {
        let value = json!({
            "items": [{ "productId": "p-1", "price": 1e27, "quantity": 1000 }],
            "shippingFee": 5
        });

        let mut aggregate = Aggregate::new();
        aggregate.set(AggregateSnapshot::from_json(&value));

        assert_eq!(aggregate.total(), Decimal::MAX);
        assert_eq!(aggregate.final_total(), Decimal::MAX);

        aggregate.set(AggregateSnapshot {
            lines: Vec::new(),
            discount: Decimal::MAX,
            shipping_fee: Decimal::MIN,
            ..AggregateSnapshot::default()
        });

        assert_eq!(aggregate.final_total(), Decimal::MIN);
    }

    #[test]
    fn empty_aggregate_has_zero_totals() {
        let mut aggregate = Aggregate::new();

        aggregate.set(AggregateSnapshot::from_json(&json!({ "items": [] })));

        assert!(aggregate.is_empty());
        assert_eq!(aggregate.total(), Decimal::ZERO);
        assert_eq!(aggregate.final_total(), Decimal::ZERO);
        assert_eq!(aggregate.tax_label(), "Tax");
    }

    #[test]
    fn reset_clears_modifiers() {
        let mut aggregate = Aggregate::new();
        aggregate.set(AggregateSnapshot::from_json(&snapshot()));

        aggregate.reset();

        assert_eq!(aggregate, Aggregate::default());
        assert_eq!(aggregate.payment_method(), None);
        assert_eq!(aggregate.coupon(), None);
    }

    #[test]
    fn set_payment_method_leaves_totals_alone() {
        let mut aggregate = Aggregate::new();
        aggregate.set(AggregateSnapshot::from_json(&snapshot()));
        let before = aggregate.final_total();

        aggregate.set_payment_method(Some(PaymentMethod::Stripe));

        assert_eq!(aggregate.payment_method(), Some(PaymentMethod::Stripe));
        assert_eq!(aggregate.final_total(), before);
    }

    #[test]
    fn duplicate_line_ids_are_merged() {
        let value = json!({
            "items": [
                { "productId": "p-1", "price": 5, "quantity": 1 },
                { "productId": "p-1", "price": 5, "quantity": 2 }
            ]
        });

        let snapshot = AggregateSnapshot::from_json(&value);

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines.first().map(|l| l.quantity), Some(3));
    }

    #[test]
    fn coupon_parses_discount_type() {
        let percentage =
            Coupon::from_json(&json!({ "code": "TEN", "discountType": "percentage", "discountValue": "10" }));

        assert_eq!(
            percentage.map(|c| (c.discount_type, c.discount_value)),
            Some((DiscountType::Percentage, Decimal::from(10)))
        );
        assert_eq!(Coupon::from_json(&json!({ "discountValue": 10 })), None);
    }

    #[test]
    fn payment_and_shipping_methods_parse_leniently() {
        assert_eq!(PaymentMethod::parse("COD"), Some(PaymentMethod::Cod));
        assert_eq!(PaymentMethod::parse("applepay"), Some(PaymentMethod::ApplePay));
        assert_eq!(PaymentMethod::parse("cheque"), None);
        assert_eq!(ShippingMethod::parse(" Express "), Some(ShippingMethod::Express));
        assert_eq!(ShippingMethod::parse("drone"), None);
    }
}
