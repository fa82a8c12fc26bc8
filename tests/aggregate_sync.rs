//! Integration tests for aggregate stores mirroring backend snapshots

use rust_decimal::Decimal;
use serde_json::{Value, json};
use testresult::TestResult;

use storefront::{
    aggregate::{
        PaymentMethod, ShippingMethod,
        store::{BuyNowStore, CartStore, SyncOutcome},
    },
    fixtures::Fixture,
    totals::total_items,
};

fn snapshot(items: &Value) -> Value {
    json!({
        "items": items,
        "discount": 0,
        "shippingFee": 0,
        "codFee": 0
    })
}

#[test]
fn identical_snapshots_apply_once() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let cart = fixture.snapshot("cart")?;
    let mut store = CartStore::new();

    assert_eq!(store.sync(Some(cart)), SyncOutcome::Applied);
    let applied = store.aggregate().clone();

    for _ in 0..3 {
        assert_eq!(store.sync(Some(&cart.clone())), SyncOutcome::Unchanged);
    }

    assert_eq!(store.revision(), 1);
    assert_eq!(store.aggregate(), &applied);

    Ok(())
}

#[test]
fn empty_aggregate_invariant() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let mut store = CartStore::new();

    store.sync(Some(fixture.snapshot("empty")?));

    let aggregate = store.aggregate();

    assert!(aggregate.is_empty());
    assert_eq!(aggregate.total(), Decimal::ZERO);
    assert_eq!(aggregate.final_total(), Decimal::ZERO);
    assert_eq!(aggregate.total_items(), 0);

    Ok(())
}

#[test]
fn derived_fields_follow_every_snapshot() {
    let mut store = CartStore::new();

    store.sync(Some(&snapshot(&json!([{ "productId": "a", "price": 10, "quantity": 1 }]))));
    store.sync(Some(&snapshot(&json!([
        { "productId": "a", "price": 10, "quantity": 2 },
        { "productId": "b", "price": 5, "quantity": 1, "tax": 10 }
    ]))));

    let aggregate = store.aggregate();

    assert_eq!(aggregate.total_items(), total_items(aggregate.lines()));
    assert_eq!(aggregate.total_unique_items(), 2);
    assert_eq!(aggregate.total(), Decimal::new(255, 1));
    assert_eq!(aggregate.final_total(), Decimal::new(255, 1));
    assert_eq!(store.revision(), 2);
}

#[test]
fn cart_and_buy_now_are_independent() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let mut cart = CartStore::new();
    let mut buy_now = BuyNowStore::new();

    cart.sync(Some(fixture.snapshot("cart")?));
    buy_now.sync(Some(fixture.snapshot("buy_now")?));

    buy_now.clear_aggregate();

    assert!(buy_now.aggregate().is_empty());
    assert_eq!(cart.aggregate().total_unique_items(), 3);

    Ok(())
}

#[test]
fn buy_now_snapshot_normalises_modifiers() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let mut store = BuyNowStore::new();

    store.sync(Some(fixture.snapshot("buy_now")?));

    let aggregate = store.aggregate();

    assert_eq!(aggregate.shipping_method(), Some(ShippingMethod::Express));
    assert_eq!(aggregate.payment_method(), Some(PaymentMethod::Cod));
    assert_eq!(aggregate.tax_label(), "Tax (21%)");
    assert_eq!(aggregate.final_total(), Decimal::new(72779, 2));

    Ok(())
}

#[test]
fn optimistic_payment_method_is_overwritten_by_next_snapshot() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let cart = fixture.snapshot("cart")?;
    let mut store = CartStore::new();

    store.sync(Some(cart));
    store.set_payment_method(Some(PaymentMethod::Cod));

    assert_eq!(store.aggregate().payment_method(), Some(PaymentMethod::Cod));

    // an unchanged snapshot keeps the optimistic selection
    assert_eq!(store.sync(Some(cart)), SyncOutcome::Unchanged);
    assert_eq!(store.aggregate().payment_method(), Some(PaymentMethod::Cod));

    let mut confirmed = cart.clone();
    confirmed["paymentMethod"] = json!("cod");

    assert_eq!(store.sync(Some(&confirmed)), SyncOutcome::Applied);
    assert_eq!(store.aggregate().payment_method(), Some(PaymentMethod::Cod));

    Ok(())
}
