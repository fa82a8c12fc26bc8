//! Storefront client
//!
//! Keeps cart and buy-now aggregates in step with the storefront backend and drives
//! checkout through an explicit [`PurchaseFlow`].

pub mod api;
pub mod config;
pub mod errors;
pub mod flow;
pub mod http;
pub mod observability;
pub mod session;

pub use api::{AggregateApi, LineRef, MockAggregateApi, NewLine, Resource};
pub use errors::{ApiError, SessionError};
pub use flow::{PurchaseFlow, Storefront};
pub use http::HttpAggregateApi;
pub use session::{AggregateSession, BuyNowSession, CartSession, SessionKind};
