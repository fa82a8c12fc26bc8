//! HTTP implementation of [`AggregateApi`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Value, json};
use storefront::{
    aggregate::{PaymentMethod, ShippingMethod},
    orders::{CreateOrder, Order, orders_from_json},
};
use tracing::{debug, warn};

use crate::{
    api::{AggregateApi, LineRef, NewLine, Resource},
    config::ApiConfig,
    errors::ApiError,
};

/// Storefront backend over HTTP with optional bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpAggregateApi {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAggregateApi {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone().filter(|token| !token.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "sending request");

        let request = self.http.request(method, format!("{}{path}", self.base_url));

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.inspect_err(|error| {
            warn!(%error, "request failed");
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = rejection_message(&text);

            warn!(status = status.as_u16(), backend_message = %message, "backend rejected request");

            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn snapshot(
        &self,
        resource: Resource,
        request: RequestBuilder,
    ) -> Result<Option<Value>, ApiError> {
        let body = self.send(request).await?;

        Ok(unwrap_snapshot(&body, resource))
    }

    fn line_request(&self, method: Method, action: &str, line: &LineRef) -> RequestBuilder {
        match line {
            LineRef::Product {
                product_id,
                variant_id,
            } => {
                let request = self.request(method, &format!("/cart/{action}/{product_id}"));

                match variant_id {
                    Some(variant_id) => request.query(&[("variantId", variant_id)]),
                    None => request,
                }
            }
            LineRef::Backend(id) => self.request(method, &format!("/cart/{action}/{id}")),
        }
    }
}

#[async_trait]
impl AggregateApi for HttpAggregateApi {
    async fn fetch(&self, resource: Resource) -> Result<Option<Value>, ApiError> {
        match self
            .snapshot(resource, self.request(Method::GET, resource.path()))
            .await
        {
            Err(ApiError::Rejected { status: 404, .. }) if resource == Resource::BuyNow => Ok(None),
            result => result,
        }
    }

    async fn add_line(&self, resource: Resource, line: NewLine) -> Result<Option<Value>, ApiError> {
        let path = match resource {
            Resource::Cart => "/cart/add",
            Resource::BuyNow => "/buy-now",
        };

        self.snapshot(resource, self.request(Method::POST, path).json(&line))
            .await
    }

    async fn update_quantity(&self, line: LineRef, quantity: u32) -> Result<Option<Value>, ApiError> {
        let request = self
            .line_request(Method::PATCH, "update", &line)
            .json(&json!({ "quantity": quantity }));

        self.snapshot(Resource::Cart, request).await
    }

    async fn remove_line(&self, line: LineRef) -> Result<Option<Value>, ApiError> {
        let request = self.line_request(Method::DELETE, "remove", &line);

        self.snapshot(Resource::Cart, request).await
    }

    async fn clear(&self, resource: Resource) -> Result<Option<Value>, ApiError> {
        let path = match resource {
            Resource::Cart => "/cart/clear",
            Resource::BuyNow => "/buy-now",
        };

        self.snapshot(resource, self.request(Method::DELETE, path))
            .await
    }

    async fn apply_coupon(&self, resource: Resource, code: String) -> Result<Option<Value>, ApiError> {
        let request = self
            .request(Method::POST, &format!("{}/apply-coupon", resource.path()))
            .json(&json!({ "code": code.trim() }));

        self.snapshot(resource, request).await
    }

    async fn remove_coupon(&self, resource: Resource) -> Result<Option<Value>, ApiError> {
        let request = self.request(Method::DELETE, &format!("{}/remove-coupon", resource.path()));

        self.snapshot(resource, request).await
    }

    async fn set_shipping_method(
        &self,
        resource: Resource,
        method: ShippingMethod,
    ) -> Result<Option<Value>, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("{}/set-shipping-method", resource.path()))
            .json(&json!({ "method": method }));

        self.snapshot(resource, request).await
    }

    async fn set_payment_method(
        &self,
        resource: Resource,
        method: PaymentMethod,
    ) -> Result<Option<Value>, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("{}/set-payment-method", resource.path()))
            .json(&json!({ "method": method }));

        self.snapshot(resource, request).await
    }

    async fn place_order(&self, order: CreateOrder) -> Result<Order, ApiError> {
        let body = self
            .send(self.request(Method::POST, "/orders").json(&order))
            .await?;

        Order::from_json(body.get("data").unwrap_or(&body)).ok_or(ApiError::MissingSnapshot("order"))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let body = self.send(self.request(Method::GET, "/orders")).await?;

        Ok(orders_from_json(&body))
    }
}

/// Extract an aggregate snapshot from a response body.
///
/// Accepts `{data:{<key>}}`, `{<key>}`, `{data}` or the bare snapshot, where the
/// key is `cart` or `buyNow`. Bodies without an object carrying `items` hold no
/// snapshot.
pub fn unwrap_snapshot(body: &Value, resource: Resource) -> Option<Value> {
    let key = resource.envelope_key();

    [
        body.get("data").and_then(|data| data.get(key)),
        body.get(key),
        body.get("data"),
        Some(body),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| candidate.get("items").is_some())
    .cloned()
}

/// The backend's `message` (or `error`) from a rejection body.
pub fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .into_iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_default()
}
