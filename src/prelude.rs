//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    aggregate::{
        Aggregate, AggregateSnapshot, Coupon, DiscountType, PaymentMethod, ShippingMethod,
        store::{
            AggregateStore, BuyNow, BuyNowStore, Cart, CartStore, StoreKind, SyncOutcome,
        },
    },
    catalog::{PriceRange, Product, ProductType},
    deals::{Deal, DealProduct, DealSections, partition_deals},
    fixtures::{Fixture, FixtureError},
    lines::{Line, LineError, LineId},
    money::{FormatConfig, PriceDisplay, format_amount, price_display},
    orders::{CreateOrder, Order, OrderStatus, PaymentStatus},
    pricing::{PricingFields, ResolvedPrice},
    summary::{CheckoutSummary, LineDisplay, SummaryError},
    totals::{LineTotals, compute_line_totals, normalize_tax},
    variants::{Attribute, Selection, Variant, find_matching_variant},
};
