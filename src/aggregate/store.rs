//! Aggregate stores
//!
//! One store per aggregate kind. A store mirrors the backend: it applies fresh
//! snapshots wholesale and skips any snapshot whose stable key matches the last one
//! it applied.

use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::aggregate::{Aggregate, AggregateSnapshot, PaymentMethod};

/// Snapshot fields that take part in change detection.
const KEY_FIELDS: [&str; 8] = [
    "items",
    "discount",
    "coupon",
    "finalTotal",
    "shippingFee",
    "shippingMethod",
    "codFee",
    "paymentMethod",
];

/// Names an aggregate kind.
pub trait StoreKind {
    /// Name used in logs and messages.
    const NAME: &'static str;
}

/// The persistent, server-backed cart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cart;

impl StoreKind for Cart {
    const NAME: &'static str = "cart";
}

/// The ephemeral single-purchase buy-now session.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyNow;

impl StoreKind for BuyNow {
    const NAME: &'static str = "buy-now";
}

/// What a call to [`AggregateStore::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new snapshot was applied.
    Applied,

    /// The snapshot matched the last applied one and was skipped.
    Unchanged,

    /// There was no snapshot, so the store was reset to empty.
    Reset,
}

/// Holds one aggregate and its change-detection state.
#[derive(Debug, Clone)]
pub struct AggregateStore<K> {
    aggregate: Aggregate,
    last_key: Option<String>,
    revision: u64,
    kind: PhantomData<K>,
}

impl<K> Default for AggregateStore<K> {
    fn default() -> Self {
        Self {
            aggregate: Aggregate::default(),
            last_key: None,
            revision: 0,
            kind: PhantomData,
        }
    }
}

/// The cart store.
pub type CartStore = AggregateStore<Cart>;

/// The buy-now store.
pub type BuyNowStore = AggregateStore<BuyNow>;

impl<K: StoreKind> AggregateStore<K> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of this store's aggregate kind.
    pub fn name(&self) -> &'static str {
        K::NAME
    }

    /// Current aggregate.
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Number of times the aggregate has changed. Skipped syncs do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mirror a backend snapshot.
    ///
    /// `None` resets the store. A snapshot whose stable key equals the last applied
    /// one is skipped; the first snapshot after a reset is always applied.
    pub fn sync(&mut self, snapshot: Option<&Value>) -> SyncOutcome {
        let Some(snapshot) = snapshot else {
            self.reset();

            return SyncOutcome::Reset;
        };

        let key = stable_key(snapshot);

        if self.last_key.as_deref() == Some(key.as_str()) {
            return SyncOutcome::Unchanged;
        }

        self.apply(AggregateSnapshot::from_json(snapshot));
        self.last_key = Some(key);

        SyncOutcome::Applied
    }

    /// Apply an already-normalised snapshot unconditionally.
    ///
    /// The next [`AggregateStore::sync`] will apply whatever it receives.
    pub fn apply(&mut self, snapshot: AggregateSnapshot) {
        self.aggregate.set(snapshot);
        self.last_key = None;
        self.revision += 1;
    }

    /// Empty the aggregate and forget the last applied snapshot.
    pub fn reset(&mut self) {
        let was_populated = self.last_key.is_some() || self.aggregate != Aggregate::default();

        self.aggregate.reset();
        self.last_key = None;

        if was_populated {
            self.revision += 1;
        }
    }

    /// Optimistically select a payment method.
    pub fn set_payment_method(&mut self, method: Option<PaymentMethod>) {
        if self.aggregate.payment_method() != method {
            self.aggregate.set_payment_method(method);
            self.revision += 1;
        }
    }
}

impl AggregateStore<BuyNow> {
    /// Full teardown once the purchase completes or is abandoned.
    ///
    /// Any flow state owned by the caller is left alone.
    pub fn clear_aggregate(&mut self) {
        self.reset();
    }
}

/// Stable serialisation of the snapshot fields that affect the aggregate.
///
/// JSON objects serialise with sorted keys, so equal snapshots give equal keys
/// regardless of the order the backend sent fields in.
pub fn stable_key(snapshot: &Value) -> String {
    let fields: Map<String, Value> = KEY_FIELDS
        .iter()
        .map(|key| {
            (
                (*key).to_string(),
                snapshot.get(*key).cloned().unwrap_or(Value::Null),
            )
        })
        .collect();

    Value::Object(fields).to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn snapshot(quantity: u32) -> Value {
        json!({
            "items": [{ "productId": "p-1", "price": 10, "quantity": quantity }],
            "discount": 0,
            "shippingFee": 5
        })
    }

    #[test]
    fn identical_snapshot_is_skipped() {
        let mut store = CartStore::new();

        assert_eq!(store.sync(Some(&snapshot(2))), SyncOutcome::Applied);
        let after_first = store.aggregate().clone();

        assert_eq!(store.sync(Some(&snapshot(2))), SyncOutcome::Unchanged);
        assert_eq!(store.revision(), 1);
        assert_eq!(store.aggregate(), &after_first);
    }

    #[test]
    fn changed_snapshot_is_applied() {
        let mut store = CartStore::new();

        store.sync(Some(&snapshot(1)));
        assert_eq!(store.sync(Some(&snapshot(3))), SyncOutcome::Applied);

        assert_eq!(store.revision(), 2);
        assert_eq!(store.aggregate().total_items(), 3);
        assert_eq!(store.aggregate().final_total(), Decimal::from(35));
    }

    #[test]
    fn missing_snapshot_resets() {
        let mut store = CartStore::new();
        store.sync(Some(&snapshot(1)));

        assert_eq!(store.sync(None), SyncOutcome::Reset);
        assert!(store.aggregate().is_empty());
        assert_eq!(store.aggregate().final_total(), Decimal::ZERO);
    }

    #[test]
    fn first_population_after_reset_is_applied() {
        let mut store = CartStore::new();
        store.sync(Some(&snapshot(1)));
        store.sync(None);

        assert_eq!(store.sync(Some(&snapshot(1))), SyncOutcome::Applied);
        assert_eq!(store.aggregate().total_items(), 1);
    }

    #[test]
    fn reset_of_empty_store_does_not_bump_revision() {
        let mut store = BuyNowStore::new();

        store.sync(None);

        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn coupon_change_is_detected() {
        let mut store = CartStore::new();
        let mut with_coupon = snapshot(1);
        with_coupon["coupon"] = json!({ "code": "TEN", "discountType": "percentage", "discountValue": 10 });

        store.sync(Some(&snapshot(1)));

        assert_eq!(store.sync(Some(&with_coupon)), SyncOutcome::Applied);
        assert!(store.aggregate().coupon().is_some());
    }

    #[test]
    fn stable_key_ignores_field_order_and_unrelated_fields() {
        let a = json!({ "discount": 1, "items": [], "updatedAt": "yesterday" });
        let b = json!({ "items": [], "discount": 1, "updatedAt": "today" });

        assert_eq!(stable_key(&a), stable_key(&b));
    }

    #[test]
    fn payment_method_change_bumps_revision_once() {
        let mut store = CartStore::new();

        store.set_payment_method(Some(PaymentMethod::Cod));
        store.set_payment_method(Some(PaymentMethod::Cod));

        assert_eq!(store.revision(), 1);
        assert_eq!(store.aggregate().payment_method(), Some(PaymentMethod::Cod));
    }

    #[test]
    fn clear_aggregate_tears_down_buy_now() {
        let mut store = BuyNowStore::new();
        store.sync(Some(&snapshot(1)));

        store.clear_aggregate();

        assert!(store.aggregate().is_empty());
        assert_eq!(store.sync(Some(&snapshot(1))), SyncOutcome::Applied);
        assert_eq!(store.name(), "buy-now");
    }
}
