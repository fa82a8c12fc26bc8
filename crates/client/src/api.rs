//! Storefront backend transport.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use serde_json::Value;
use storefront::{
    aggregate::{PaymentMethod, ShippingMethod},
    lines::{Line, LineId},
    orders::{CreateOrder, Order},
};

use crate::errors::ApiError;

/// Which server-side aggregate a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The persistent cart.
    Cart,

    /// The single-purchase buy-now session.
    BuyNow,
}

impl Resource {
    /// Name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Cart => "cart",
            Resource::BuyNow => "buy-now",
        }
    }

    /// Root path of the resource.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Cart => "/cart",
            Resource::BuyNow => "/buy-now",
        }
    }

    /// Key the backend wraps the snapshot in.
    pub fn envelope_key(self) -> &'static str {
        match self {
            Resource::Cart => "cart",
            Resource::BuyNow => "buyNow",
        }
    }
}

/// How the backend addresses an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
    /// By product, optionally narrowed to a variant.
    Product {
        /// Product identifier.
        product_id: String,

        /// Variant identifier.
        variant_id: Option<String>,
    },

    /// By the backend's own line identifier.
    Backend(String),
}

impl LineRef {
    /// Reference a line the way the backend expects, preferring the product.
    pub fn for_line(line: &Line) -> Self {
        match &line.backend_id {
            Some(backend_id) if line.product_id.is_empty() => LineRef::Backend(backend_id.clone()),
            _ => LineRef::Product {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
            },
        }
    }
}

/// Request body for adding a product (or variant) to an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLine {
    /// Product identifier.
    pub product_id: String,

    /// Variant identifier, for variable products.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    /// Units to add.
    pub quantity: u32,
}

impl NewLine {
    /// Identifier of the line this request creates or grows.
    pub fn line_id(&self) -> LineId {
        LineId::for_product(&self.product_id, self.variant_id.as_deref())
    }
}

/// Calls to the storefront backend.
///
/// Aggregate mutations return the snapshot carried by the response, or `None`
/// when the response carried none.
#[automock]
#[async_trait]
pub trait AggregateApi: Send + Sync {
    /// Fetch the current snapshot. `None` means the aggregate does not exist.
    async fn fetch(&self, resource: Resource) -> Result<Option<Value>, ApiError>;

    /// Add a product, or start a buy-now session with it.
    async fn add_line(&self, resource: Resource, line: NewLine) -> Result<Option<Value>, ApiError>;

    /// Change the quantity of a cart line.
    async fn update_quantity(&self, line: LineRef, quantity: u32) -> Result<Option<Value>, ApiError>;

    /// Remove a cart line.
    async fn remove_line(&self, line: LineRef) -> Result<Option<Value>, ApiError>;

    /// Empty the cart, or discard the buy-now session.
    async fn clear(&self, resource: Resource) -> Result<Option<Value>, ApiError>;

    /// Apply a coupon code.
    async fn apply_coupon(&self, resource: Resource, code: String) -> Result<Option<Value>, ApiError>;

    /// Remove the applied coupon.
    async fn remove_coupon(&self, resource: Resource) -> Result<Option<Value>, ApiError>;

    /// Choose a delivery speed.
    async fn set_shipping_method(
        &self,
        resource: Resource,
        method: ShippingMethod,
    ) -> Result<Option<Value>, ApiError>;

    /// Choose a payment method.
    async fn set_payment_method(
        &self,
        resource: Resource,
        method: PaymentMethod,
    ) -> Result<Option<Value>, ApiError>;

    /// Place an order from the cart or the buy-now session.
    async fn place_order(&self, order: CreateOrder) -> Result<Order, ApiError>;

    /// The customer's past orders.
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;
}
