//! Purchase flows
//!
//! The caller chooses which aggregate a checkout consumes by holding a
//! [`PurchaseFlow`]. Nothing global records it, so tearing down the buy-now store
//! never changes which checkout is in progress.

use std::{fmt, sync::Arc};

use storefront::{
    aggregate::{Aggregate, store::SyncOutcome},
    catalog::{Product, ProductType},
    money::FormatConfig,
    orders::{CreateOrder, Order},
    summary::CheckoutSummary,
    variants::Selection,
};
use tracing::info;

use crate::{
    api::{AggregateApi, NewLine},
    errors::SessionError,
    session::{BuyNowSession, CartSession},
};

/// Which aggregate a checkout consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurchaseFlow {
    /// Check out the whole cart.
    #[default]
    Cart,

    /// Check out a single buy-now purchase.
    BuyNow,
}

/// Cart and buy-now sessions over one backend.
pub struct Storefront {
    api: Arc<dyn AggregateApi>,
    cart: CartSession,
    buy_now: BuyNowSession,
    format: FormatConfig,
}

impl fmt::Debug for Storefront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.cart)
            .field("buy_now", &self.buy_now)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Sessions sharing `api`, formatting amounts with `format`.
    pub fn new(api: Arc<dyn AggregateApi>, format: FormatConfig) -> Self {
        Self {
            cart: CartSession::new(Arc::clone(&api)),
            buy_now: BuyNowSession::new(Arc::clone(&api)),
            api,
            format,
        }
    }

    /// The cart session.
    pub fn cart(&self) -> &CartSession {
        &self.cart
    }

    /// The buy-now session.
    pub fn buy_now_session(&self) -> &BuyNowSession {
        &self.buy_now
    }

    /// The aggregate a flow checks out.
    pub fn aggregate(&self, flow: PurchaseFlow) -> Aggregate {
        match flow {
            PurchaseFlow::Cart => self.cart.aggregate(),
            PurchaseFlow::BuyNow => self.buy_now.aggregate(),
        }
    }

    /// Re-fetch the aggregate a flow checks out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn refresh(&self, flow: PurchaseFlow) -> Result<SyncOutcome, SessionError> {
        let outcome = match flow {
            PurchaseFlow::Cart => self.cart.refresh().await?,
            PurchaseFlow::BuyNow => self.buy_now.refresh().await?,
        };

        Ok(outcome)
    }

    /// Add `quantity` of the selected product variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable product has no matching variant, the
    /// selection is out of stock, or the backend call fails.
    pub async fn add_to_cart(
        &self,
        product: &Product,
        selection: &Selection,
        quantity: u32,
    ) -> Result<PurchaseFlow, SessionError> {
        self.cart.add_line(new_line(product, selection, quantity)?).await?;

        Ok(PurchaseFlow::Cart)
    }

    /// Start a buy-now session for the selected product variant.
    ///
    /// The cart is left as it is. Pass the returned flow to checkout.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable product has no matching variant, the
    /// selection is out of stock, or the backend call fails.
    pub async fn buy_now(
        &self,
        product: &Product,
        selection: &Selection,
        quantity: u32,
    ) -> Result<PurchaseFlow, SessionError> {
        self.buy_now
            .add_line(new_line(product, selection, quantity)?)
            .await?;

        info!(product = %product.id, "buy-now session started");

        Ok(PurchaseFlow::BuyNow)
    }

    /// Formatted summary of the aggregate a flow checks out.
    pub fn checkout_summary(&self, flow: PurchaseFlow) -> CheckoutSummary {
        CheckoutSummary::from_aggregate(&self.aggregate(flow), &self.format)
    }

    /// Place the order for a flow and empty the aggregate it consumed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PaymentMethodRequired`] when no payment method is
    /// selected, or [`SessionError::Api`] if the backend refuses the order.
    pub async fn finish_purchase(
        &self,
        flow: PurchaseFlow,
        address_id: &str,
    ) -> Result<Order, SessionError> {
        let payment_method = self
            .aggregate(flow)
            .payment_method()
            .ok_or(SessionError::PaymentMethodRequired)?;

        let order = self
            .api
            .place_order(CreateOrder {
                address_id: address_id.to_string(),
                payment_method,
                is_buy_now: flow == PurchaseFlow::BuyNow,
            })
            .await
            .map_err(SessionError::api("Failed to place order"))?;

        match flow {
            PurchaseFlow::Cart => self.cart.forget(),
            PurchaseFlow::BuyNow => self.buy_now.forget(),
        }

        info!(order = %order.id, ?flow, total = %order.total_amount, "order placed");

        Ok(order)
    }

    /// The customer's past orders.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn orders(&self) -> Result<Vec<Order>, SessionError> {
        self.api
            .list_orders()
            .await
            .map_err(SessionError::api("Failed to load orders"))
    }
}

fn new_line(
    product: &Product,
    selection: &Selection,
    quantity: u32,
) -> Result<NewLine, SessionError> {
    let variant = product.resolve_variant(selection);

    if product.product_type == ProductType::Variable && variant.is_none() {
        return Err(SessionError::VariantRequired(product.id.clone()));
    }

    let line = NewLine {
        product_id: product.id.clone(),
        variant_id: variant.and_then(|variant| variant.id.clone()),
        quantity,
    };

    if product.stock_for(selection) <= 0 {
        return Err(SessionError::OutOfStock(line.line_id()));
    }

    Ok(line)
}
