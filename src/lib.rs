//! Storefront
//!
//! Pricing resolution, line totals and cart/buy-now aggregation for an e-commerce
//! storefront that mirrors a remote REST backend.

pub mod aggregate;
pub mod catalog;
pub mod deals;
pub mod fixtures;
pub mod lines;
pub mod money;
pub mod normalize;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod summary;
pub mod totals;
pub mod variants;
