//! Client errors.

use storefront::lines::{LineError, LineId};
use thiserror::Error;

/// Errors raised by the transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend rejected the request with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,

        /// The backend's `message`, empty when it sent none.
        message: String,
    },

    /// The response body was not JSON.
    #[error("unexpected response body")]
    Decode(#[from] serde_json::Error),

    /// The response did not carry the expected resource.
    #[error("response carried no {0}")]
    MissingSnapshot(&'static str),
}

impl ApiError {
    /// The backend's own message, if it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Errors raised by sessions and purchase flows.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A backend call failed. `failure` is the fallback notice.
    #[error("{failure}")]
    Api {
        /// Notice shown when the backend gives no message.
        failure: &'static str,

        /// Underlying transport error.
        #[source]
        source: ApiError,
    },

    /// A request for this line is already in flight.
    #[error("an update for line {0} is already in progress")]
    Busy(LineId),

    /// The line is not in the aggregate.
    #[error("line {0} not found")]
    NotFound(LineId),

    /// No more stock is available for the line.
    #[error("line {0} is out of stock")]
    OutOfStock(LineId),

    /// The requested line change is invalid.
    #[error(transparent)]
    Line(#[from] LineError),

    /// The coupon code is blank.
    #[error("coupon code is empty")]
    EmptyCoupon,

    /// A variable product needs a complete variant selection.
    #[error("no variant matches the selection for product {0}")]
    VariantRequired(String),

    /// The aggregate has no payment method to place an order with.
    #[error("no payment method selected")]
    PaymentMethodRequired,
}

impl SessionError {
    pub(crate) fn api(failure: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| SessionError::Api { failure, source }
    }

    /// User-visible notice for this error.
    pub fn notice(&self) -> String {
        match self {
            SessionError::Api { failure, source } => source
                .backend_message()
                .unwrap_or(*failure)
                .to_string(),
            SessionError::Busy(_) => "Please wait for the previous update to finish".to_string(),
            SessionError::NotFound(_) => "Item is no longer in your cart".to_string(),
            SessionError::OutOfStock(_) => "Not enough stock available".to_string(),
            SessionError::Line(_) => "Quantity must be at least 1".to_string(),
            SessionError::EmptyCoupon => "Please enter a coupon code".to_string(),
            SessionError::VariantRequired(_) => "Please select all options".to_string(),
            SessionError::PaymentMethodRequired => "Please select a payment method".to_string(),
        }
    }
}
