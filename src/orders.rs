//! Orders
//!
//! Historic, immutable order snapshots. They share the line shape and totals rules
//! of carts, but the backend's `totalAmount` is always the amount payable.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::{
    aggregate::{Coupon, PaymentMethod},
    lines::Line,
    normalize::{amount, amount_field, field, text_field},
    totals,
};

/// Fulfilment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    /// Accepted, not yet shipped.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer.
    Delivered,

    /// Cancelled before delivery.
    Cancelled,

    /// A status this client does not know.
    Other(String),
}

impl OrderStatus {
    fn parse(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "processing" => OrderStatus::Processing,
            "shipped" => OrderStatus::Shipped,
            "delivered" => OrderStatus::Delivered,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(text.to_string()),
        }
    }
}

/// Payment state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,

    /// Paid in full.
    Paid,

    /// Payment attempt failed.
    Failed,

    /// Refunded.
    Refunded,

    /// Not paid, e.g. cash on delivery.
    Unpaid,

    /// A status this client does not know.
    Other(String),
}

impl PaymentStatus {
    fn parse(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            "refunded" => PaymentStatus::Refunded,
            "unpaid" => PaymentStatus::Unpaid,
            _ => PaymentStatus::Other(text.to_string()),
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Backend identifier.
    pub id: String,

    /// Ordered lines.
    pub lines: Vec<Line>,

    /// Backend subtotal, as recorded at placement.
    pub subtotal: Decimal,

    /// Shipping fee.
    pub shipping_fee: Decimal,

    /// Cash-on-delivery fee.
    pub cod_fee: Decimal,

    /// Coupon discount.
    pub discount: Decimal,

    /// Coupon applied at placement.
    pub coupon: Option<Coupon>,

    /// Amount payable.
    pub total_amount: Decimal,

    /// Order-level tax, when the backend records one.
    pub recorded_tax: Option<Decimal>,

    /// Shipping method name.
    pub shipping_method: Option<String>,

    /// Payment method.
    pub payment_method: Option<PaymentMethod>,

    /// Payment state.
    pub payment_status: Option<PaymentStatus>,

    /// Fulfilment state.
    pub order_status: Option<OrderStatus>,

    /// Placement time as sent by the backend.
    pub created_at: Option<String>,
}

impl Order {
    /// Normalise a backend order, accepting a bare object or `{order: {...}}`.
    ///
    /// Returns `None` without an identifier.
    pub fn from_json(value: &Value) -> Option<Self> {
        let source = value.get("order").unwrap_or(value);

        let lines = source
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Line::from_json).collect())
            .unwrap_or_default();

        Some(Self {
            id: text_field(source, &["_id", "id"])?,
            lines,
            subtotal: amount_field(source, &["subtotal", "sub_total", "sub_total_amount"])
                .unwrap_or_default(),
            shipping_fee: amount_field(source, &["shippingFee", "shipping_fee"]).unwrap_or_default(),
            cod_fee: amount_field(source, &["codFee", "cod_fee"]).unwrap_or_default(),
            discount: amount_field(source, &["discount", "discount_amount"]).unwrap_or_default(),
            coupon: field(source, &["coupon"]).and_then(Coupon::from_json),
            total_amount: amount_field(source, &["totalAmount", "total_amount", "total"])
                .unwrap_or_default(),
            recorded_tax: field(source, &["taxTotal", "tax"])
                .filter(|tax| tax.is_number())
                .and_then(amount),
            shipping_method: text_field(
                source,
                &["shippingMethod", "shipping_method", "shipping_method_name", "shipping"],
            ),
            payment_method: text_field(source, &["paymentMethod", "payment_method"])
                .and_then(|method| PaymentMethod::parse(&method)),
            payment_status: text_field(source, &["paymentStatus", "payment_status"])
                .map(|status| PaymentStatus::parse(&status)),
            order_status: text_field(source, &["orderStatus", "order_status", "status"])
                .map(|status| OrderStatus::parse(&status)),
            created_at: text_field(source, &["createdAt", "created_at"]),
        })
    }

    /// Sum of per-line base totals.
    pub fn subtotal_without_tax(&self) -> Decimal {
        totals::subtotal_without_tax(&self.lines)
    }

    /// Order-level tax when recorded, otherwise derived from the lines.
    pub fn tax_total(&self) -> Decimal {
        self.recorded_tax
            .unwrap_or_else(|| totals::tax_total(&self.lines))
    }

    /// Label for the tax row.
    pub fn tax_label(&self) -> String {
        totals::tax_label(&self.lines, self.tax_total())
    }

    /// Units across all lines.
    pub fn total_items(&self) -> u64 {
        totals::total_items(&self.lines)
    }
}

/// Read an order list from a backend response (`{data:{orders}}`, `{orders}` or a
/// bare array).
pub fn orders_from_json(value: &Value) -> Vec<Order> {
    let list = value
        .pointer("/data/orders")
        .or_else(|| value.get("orders"))
        .unwrap_or(value);

    list.as_array()
        .map(|orders| orders.iter().filter_map(Order::from_json).collect())
        .unwrap_or_default()
}

/// Request body for placing an order from the cart or a buy-now session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    /// Saved shipping address.
    pub address_id: String,

    /// Chosen payment method.
    pub payment_method: PaymentMethod,

    /// Whether the order consumes the buy-now session instead of the cart.
    pub is_buy_now: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn order() -> Value {
        json!({
            "order": {
                "_id": "o-1",
                "items": [
                    { "product": "p-1", "name": "Phone", "price": 100, "originalPrice": 100, "dealPrice": 80, "quantity": 1, "taxRate": "10" },
                    { "product": "p-2", "name": "Case", "price": 20, "quantity": 2, "tax_percentage": 10 }
                ],
                "sub_total": 120,
                "shipping_fee": 5,
                "codFee": 3,
                "discount": 0,
                "total_amount": 140,
                "paymentMethod": "COD",
                "paymentStatus": "unpaid",
                "orderStatus": "processing"
            }
        })
    }

    #[test]
    fn from_json_maps_snake_case_and_envelope() -> TestResult {
        let order = Order::from_json(&order()).ok_or("order")?;

        assert_eq!(order.id, "o-1");
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.subtotal, Decimal::from(120));
        assert_eq!(order.shipping_fee, Decimal::from(5));
        assert_eq!(order.total_amount, Decimal::from(140));
        assert_eq!(order.payment_method, Some(PaymentMethod::Cod));
        assert_eq!(order.payment_status, Some(PaymentStatus::Unpaid));
        assert_eq!(order.order_status, Some(OrderStatus::Processing));

        Ok(())
    }

    #[test]
    fn derives_tax_from_lines() -> TestResult {
        let order = Order::from_json(&order()).ok_or("order")?;

        assert_eq!(order.subtotal_without_tax(), Decimal::from(120));
        assert_eq!(order.tax_total(), Decimal::from(12));
        assert_eq!(order.tax_label(), "Tax (10%)");
        assert_eq!(order.total_items(), 3);

        Ok(())
    }

    #[test]
    fn recorded_tax_wins() -> TestResult {
        let mut value = order();
        value["order"]["taxTotal"] = json!(9.5);

        let order = Order::from_json(&value).ok_or("order")?;

        assert_eq!(order.tax_total(), Decimal::new(95, 1));

        Ok(())
    }

    #[test]
    fn unknown_statuses_are_kept() -> TestResult {
        let order = Order::from_json(&json!({
            "_id": "o-2",
            "orderStatus": "returned",
            "paymentStatus": "chargeback"
        }))
        .ok_or("order")?;

        assert_eq!(order.order_status, Some(OrderStatus::Other("returned".to_string())));
        assert_eq!(order.payment_status, Some(PaymentStatus::Other("chargeback".to_string())));
        assert!(order.lines.is_empty());

        Ok(())
    }

    #[test]
    fn orders_from_json_reads_list() {
        let response = json!({ "data": { "orders": [{ "_id": "a" }, { "_id": "b" }, {}] } });

        let orders = orders_from_json(&response);

        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn create_order_serialises_camel_case() -> TestResult {
        let body = serde_json::to_value(CreateOrder {
            address_id: "addr-1".to_string(),
            payment_method: PaymentMethod::Stripe,
            is_buy_now: true,
        })?;

        assert_eq!(
            body,
            json!({ "addressId": "addr-1", "paymentMethod": "stripe", "isBuyNow": true })
        );

        Ok(())
    }
}
