//! Purchase flows against a mocked backend, fed by the storefront fixtures.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{Value, json};
use storefront::{
    aggregate::PaymentMethod,
    fixtures::Fixture,
    money::FormatConfig,
    orders::Order,
    variants::{Attribute, Selection},
};
use storefront_client::{MockAggregateApi, PurchaseFlow, Resource, SessionError, Storefront};
use testresult::TestResult;

fn fixture() -> Result<Fixture, storefront::fixtures::FixtureError> {
    let mut fixture =
        Fixture::with_base_path(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"));

    fixture
        .load_snapshots("storefront")?
        .load_products("storefront")?;

    Ok(fixture)
}

fn snapshot(fixture: &Fixture, key: &str) -> Result<Value, storefront::fixtures::FixtureError> {
    fixture.snapshot(key).cloned()
}

#[tokio::test]
async fn buy_now_checkout_leaves_cart_alone() -> TestResult {
    let fixture = fixture()?;
    let cart = snapshot(&fixture, "cart")?;
    let buy_now = snapshot(&fixture, "buy_now")?;

    let mut api = MockAggregateApi::new();

    api.expect_fetch()
        .once()
        .withf(|resource| *resource == Resource::Cart)
        .return_once(move |_| Ok(Some(cart)));
    api.expect_add_line()
        .once()
        .withf(|resource, line| {
            *resource == Resource::BuyNow
                && line.product_id == "phone"
                && line.variant_id.as_deref() == Some("v-256")
                && line.quantity == 1
        })
        .return_once(move |_, _| Ok(Some(buy_now)));
    api.expect_place_order()
        .once()
        .withf(|order| {
            order.is_buy_now && order.payment_method == PaymentMethod::Cod && order.address_id == "addr-1"
        })
        .return_once(|_| {
            Order::from_json(&json!({ "_id": "o-1", "totalAmount": "727.79" })).ok_or(
                storefront_client::ApiError::MissingSnapshot("order"),
            )
        });

    let storefront = Storefront::new(Arc::new(api), FormatConfig::default());

    storefront.refresh(PurchaseFlow::Cart).await?;

    let selection = Selection::new().with(Attribute::Storage, "256GB");
    let flow = storefront
        .buy_now(fixture.product("phone")?, &selection, 1)
        .await?;

    assert_eq!(flow, PurchaseFlow::BuyNow);
    assert_eq!(
        storefront.aggregate(flow).final_total(),
        Decimal::new(72779, 2)
    );
    assert_eq!(
        storefront.aggregate(PurchaseFlow::Cart).final_total(),
        Decimal::new(62580, 2)
    );

    let summary = storefront.checkout_summary(flow);
    assert_eq!(summary.tax_label, "Tax (21%)");
    assert!(summary.cod_fee.is_some());

    let order = storefront.finish_purchase(flow, "addr-1").await?;

    assert_eq!(order.id, "o-1");
    assert!(storefront.aggregate(PurchaseFlow::BuyNow).is_empty());
    assert_eq!(storefront.aggregate(PurchaseFlow::Cart).total_unique_items(), 3);

    Ok(())
}

#[tokio::test]
async fn cart_checkout_consumes_cart() -> TestResult {
    let fixture = fixture()?;
    let cart = snapshot(&fixture, "cart")?;

    let mut api = MockAggregateApi::new();

    api.expect_fetch()
        .once()
        .return_once(move |_| Ok(Some(cart)));
    api.expect_place_order()
        .once()
        .withf(|order| !order.is_buy_now && order.payment_method == PaymentMethod::Stripe)
        .return_once(|_| {
            Order::from_json(&json!({ "_id": "o-2", "totalAmount": "625.80" })).ok_or(
                storefront_client::ApiError::MissingSnapshot("order"),
            )
        });

    let storefront = Storefront::new(Arc::new(api), FormatConfig::default());
    storefront.refresh(PurchaseFlow::Cart).await?;

    let order = storefront.finish_purchase(PurchaseFlow::Cart, "addr-1").await?;

    assert_eq!(order.total_amount, Decimal::new(6258, 1));
    assert!(storefront.aggregate(PurchaseFlow::Cart).is_empty());

    Ok(())
}

#[tokio::test]
async fn checkout_without_payment_method_is_refused() -> TestResult {
    let mut api = MockAggregateApi::new();
    api.expect_place_order().never();

    let storefront = Storefront::new(Arc::new(api), FormatConfig::default());

    let result = storefront.finish_purchase(PurchaseFlow::BuyNow, "addr-1").await;

    assert!(matches!(result, Err(SessionError::PaymentMethodRequired)));

    Ok(())
}

#[tokio::test]
async fn unavailable_selections_never_reach_backend() -> TestResult {
    let fixture = fixture()?;
    let phone = fixture.product("phone")?;

    let mut api = MockAggregateApi::new();
    api.expect_add_line().never();

    let storefront = Storefront::new(Arc::new(api), FormatConfig::default());

    let missing = Selection::new().with(Attribute::Storage, "1TB");
    let sold_out = Selection::new().with(Attribute::Storage, "512GB");

    assert!(matches!(
        storefront.add_to_cart(phone, &missing, 1).await,
        Err(SessionError::VariantRequired(id)) if id == "phone"
    ));
    assert!(matches!(
        storefront.buy_now(phone, &sold_out, 1).await,
        Err(SessionError::OutOfStock(id)) if id.as_str() == "phone.v-512"
    ));

    Ok(())
}
