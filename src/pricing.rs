//! Pricing
//!
//! Resolves which unit price applies to a line and what reference price and discount
//! badge to show alongside it.
//!
//! Two independent discount mechanisms exist: a *deal* (backend-computed
//! `original_price`/`deal_price` pair) and a *sale* (`price`/`sale_price` pair). They
//! never stack; an active deal always wins.
//!
//! The resolution order for the effective unit price is:
//!
//! 1. active deal: `deal_price`
//! 2. active sale: `sale_price`
//! 3. positive `original_price`
//! 4. `price`

use rust_decimal::Decimal;

use crate::money::{FormatConfig, PriceDisplay, format_amount, percent_dropped};

/// Raw pricing fields carried by a cart, buy-now, order or catalog line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingFields {
    /// List unit price. Missing or malformed values are normalised to zero.
    pub price: Decimal,

    /// Backend-computed pre-deal unit price.
    pub original_price: Option<Decimal>,

    /// Backend-computed deal unit price.
    pub deal_price: Option<Decimal>,

    /// Legacy sale unit price.
    pub sale_price: Option<Decimal>,
}

impl PricingFields {
    /// Pricing fields for a plain list price with no discount mechanism.
    pub fn list(price: Decimal) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }

    /// Whether the deal pair is active for these fields.
    pub fn has_active_deal(&self) -> bool {
        has_active_deal(self.original_price, self.deal_price)
    }

    /// Whether the sale pair is active for these fields.
    pub fn has_active_sale(&self) -> bool {
        has_active_sale(self.price, self.sale_price)
    }
}

/// A deal is active when both prices are positive and the deal is strictly cheaper.
pub fn has_active_deal(original_price: Option<Decimal>, deal_price: Option<Decimal>) -> bool {
    match (original_price, deal_price) {
        (Some(original), Some(deal)) => {
            original > Decimal::ZERO && deal > Decimal::ZERO && deal < original
        }
        _ => false,
    }
}

/// A sale is active when both prices are positive and the sale is strictly cheaper.
pub fn has_active_sale(price: Decimal, sale_price: Option<Decimal>) -> bool {
    sale_price.is_some_and(|sale| price > Decimal::ZERO && sale > Decimal::ZERO && sale < price)
}

/// Unit price actually charged for the line.
pub fn effective_unit_price(fields: &PricingFields) -> Decimal {
    if fields.has_active_deal() {
        if let Some(deal) = fields.deal_price {
            return deal;
        }
    }

    if fields.has_active_sale() {
        if let Some(sale) = fields.sale_price {
            return sale;
        }
    }

    match fields.original_price {
        Some(original) if original > Decimal::ZERO => original,
        _ => fields.price,
    }
}

/// Struck-through reference price, or `None` when no discount applies.
pub fn base_price_for_display(fields: &PricingFields) -> Option<Decimal> {
    if fields.has_active_deal() {
        fields.original_price
    } else if fields.has_active_sale() {
        Some(fields.price)
    } else {
        None
    }
}

/// Whole-number discount percentage against [`base_price_for_display`].
pub fn discount_percent(fields: &PricingFields) -> Option<u32> {
    let base = base_price_for_display(fields)?;

    percent_dropped(base, effective_unit_price(fields))
}

/// Fully resolved pricing for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    /// Unit price actually charged.
    pub effective: Decimal,

    /// Struck-through reference price.
    pub base: Option<Decimal>,

    /// Discount badge percentage.
    pub discount_percent: Option<u32>,

    /// Whether the deal mechanism produced the effective price.
    pub has_deal: bool,

    /// Whether the sale mechanism produced the effective price.
    pub has_sale: bool,
}

impl ResolvedPrice {
    /// Resolve the given pricing fields.
    pub fn resolve(fields: &PricingFields) -> Self {
        let has_deal = fields.has_active_deal();

        Self {
            effective: effective_unit_price(fields),
            base: base_price_for_display(fields),
            discount_percent: discount_percent(fields),
            has_deal,
            has_sale: !has_deal && fields.has_active_sale(),
        }
    }

    /// Format the resolved price for display.
    pub fn display(&self, config: &FormatConfig) -> PriceDisplay {
        PriceDisplay {
            price: format_amount(self.effective, config),
            base_price: self.base.map(|base| format_amount(base, config)),
            discount: self.discount_percent,
        }
    }
}

impl From<&PricingFields> for ResolvedPrice {
    fn from(fields: &PricingFields) -> Self {
        Self::resolve(fields)
    }
}
