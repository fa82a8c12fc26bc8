//! Aggregate sessions
//!
//! A session pairs one aggregate store with the backend. Every mutation awaits the
//! backend first and then mirrors the snapshot it returns, so local state never
//! runs ahead of the server. The one exception is the payment method, which is
//! selected optimistically and reverted when the backend refuses it.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rustc_hash::FxHashSet;
use serde_json::Value;
use storefront::{
    aggregate::{
        Aggregate, PaymentMethod, ShippingMethod,
        store::{AggregateStore, BuyNow, Cart, StoreKind, SyncOutcome},
    },
    lines::{self, Line, LineError, LineId},
};
use tracing::{debug, info, warn};

use crate::{
    api::{AggregateApi, LineRef, NewLine, Resource},
    errors::{ApiError, SessionError},
};

/// Ties a store kind to the backend resource it mirrors.
pub trait SessionKind: StoreKind + Send + Sync + 'static {
    /// Backend resource.
    const RESOURCE: Resource;
}

impl SessionKind for Cart {
    const RESOURCE: Resource = Resource::Cart;
}

impl SessionKind for BuyNow {
    const RESOURCE: Resource = Resource::BuyNow;
}

/// The cart session.
pub type CartSession = AggregateSession<Cart>;

/// The buy-now session.
pub type BuyNowSession = AggregateSession<BuyNow>;

/// One aggregate kept in step with the backend.
pub struct AggregateSession<K> {
    api: Arc<dyn AggregateApi>,
    store: Mutex<AggregateStore<K>>,
    busy: Mutex<FxHashSet<LineId>>,
}

impl<K> fmt::Debug for AggregateSession<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateSession").finish_non_exhaustive()
    }
}

impl<K: SessionKind> AggregateSession<K> {
    /// An empty session talking to `api`.
    pub fn new(api: Arc<dyn AggregateApi>) -> Self {
        Self {
            api,
            store: Mutex::new(AggregateStore::new()),
            busy: Mutex::new(FxHashSet::default()),
        }
    }

    /// A copy of the current aggregate.
    pub fn aggregate(&self) -> Aggregate {
        self.store().aggregate().clone()
    }

    /// Number of times the aggregate has changed.
    pub fn revision(&self) -> u64 {
        self.store().revision()
    }

    /// Whether a request for the line is in flight.
    pub fn is_busy(&self, id: &LineId) -> bool {
        self.busy().contains(id)
    }

    /// Re-fetch the aggregate from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails; the store is left
    /// unchanged.
    pub async fn refresh(&self) -> Result<SyncOutcome, SessionError> {
        self.refetch("Failed to load items").await
    }

    /// Add a product (or variant) to the aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero quantity, while another request for the same
    /// line is in flight, or if the backend call fails.
    pub async fn add_line(&self, line: NewLine) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to add item";

        if line.quantity == 0 {
            return Err(LineError::InvalidQuantity.into());
        }

        let _guard = self.acquire(line.line_id())?;

        let response = self
            .api
            .add_line(K::RESOURCE, line)
            .await
            .map_err(failed::<K>(FAILURE))?;

        self.settle(response, FAILURE).await
    }

    /// Empty the aggregate on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn clear(&self) -> Result<SyncOutcome, SessionError> {
        let response = self
            .api
            .clear(K::RESOURCE)
            .await
            .map_err(failed::<K>("Failed to clear items"))?;

        Ok(self.sync(response.as_ref()))
    }

    /// Apply a coupon code.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCoupon`] for a blank code, or
    /// [`SessionError::Api`] carrying the backend's reason.
    pub async fn apply_coupon(&self, code: &str) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to apply coupon";

        let code = code.trim();

        if code.is_empty() {
            return Err(SessionError::EmptyCoupon);
        }

        let response = self
            .api
            .apply_coupon(K::RESOURCE, code.to_string())
            .await
            .map_err(failed::<K>(FAILURE))?;

        self.settle(response, FAILURE).await
    }

    /// Remove the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn remove_coupon(&self) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to remove coupon";

        let response = self
            .api
            .remove_coupon(K::RESOURCE)
            .await
            .map_err(failed::<K>(FAILURE))?;

        self.settle(response, FAILURE).await
    }

    /// Choose a delivery speed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn set_shipping_method(
        &self,
        method: ShippingMethod,
    ) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to update shipping method";

        let response = self
            .api
            .set_shipping_method(K::RESOURCE, method)
            .await
            .map_err(failed::<K>(FAILURE))?;

        self.settle(response, FAILURE).await
    }

    /// Choose a payment method.
    ///
    /// The selection shows immediately and is reverted if the backend refuses it or
    /// the follow-up fetch fails.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails.
    pub async fn set_payment_method(
        &self,
        method: PaymentMethod,
    ) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to update payment method";

        let previous = {
            let mut store = self.store();
            let previous = store.aggregate().payment_method();

            store.set_payment_method(Some(method));

            previous
        };

        let settled = match self.api.set_payment_method(K::RESOURCE, method).await {
            Ok(response) => self.settle(response, FAILURE).await,
            Err(source) => Err(failed::<K>(FAILURE)(source)),
        };

        if settled.is_err() {
            self.store().set_payment_method(previous);
        }

        settled
    }

    /// Empty the local aggregate without calling the backend, e.g. once an order
    /// has consumed it.
    pub fn forget(&self) {
        self.store().reset();

        debug!(store = K::NAME, "aggregate forgotten");
    }

    async fn settle(
        &self,
        response: Option<Value>,
        failure: &'static str,
    ) -> Result<SyncOutcome, SessionError> {
        match response {
            Some(snapshot) => Ok(self.sync(Some(&snapshot))),
            None => self.refetch(failure).await,
        }
    }

    async fn refetch(&self, failure: &'static str) -> Result<SyncOutcome, SessionError> {
        let snapshot = self
            .api
            .fetch(K::RESOURCE)
            .await
            .map_err(failed::<K>(failure))?;

        Ok(self.sync(snapshot.as_ref()))
    }

    fn sync(&self, snapshot: Option<&Value>) -> SyncOutcome {
        let mut store = self.store();
        let outcome = store.sync(snapshot);

        match outcome {
            SyncOutcome::Unchanged => debug!(store = K::NAME, "snapshot unchanged"),
            SyncOutcome::Applied | SyncOutcome::Reset => info!(
                store = K::NAME,
                ?outcome,
                revision = store.revision(),
                lines = store.aggregate().total_unique_items(),
                final_total = %store.aggregate().final_total(),
                "snapshot applied"
            ),
        }

        outcome
    }

    fn line(&self, id: &LineId) -> Result<Line, SessionError> {
        lines::find(self.store().aggregate().lines(), id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    fn acquire(&self, id: LineId) -> Result<BusyGuard<'_>, SessionError> {
        if !self.busy().insert(id.clone()) {
            return Err(SessionError::Busy(id));
        }

        Ok(BusyGuard {
            busy: &self.busy,
            id,
        })
    }

    fn store(&self) -> MutexGuard<'_, AggregateStore<K>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn busy(&self) -> MutexGuard<'_, FxHashSet<LineId>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AggregateSession<Cart> {
    /// Set a cart line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not in the cart, the quantity exceeds known
    /// stock, another request for the line is in flight, or the backend call fails.
    pub async fn update_quantity(
        &self,
        id: &LineId,
        quantity: u32,
    ) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to update quantity";

        if quantity == 0 {
            return self.remove_line(id).await;
        }

        let line = self.line(id)?;

        if line.stock.is_some_and(|stock| i64::from(quantity) > stock) {
            return Err(SessionError::OutOfStock(id.clone()));
        }

        let _guard = self.acquire(id.clone())?;

        let response = self
            .api
            .update_quantity(LineRef::for_line(&line), quantity)
            .await
            .map_err(failed::<Cart>(FAILURE))?;

        self.settle(response, FAILURE).await
    }

    /// Add one unit to a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::OutOfStock`] when no further unit is available, or
    /// any error of [`AggregateSession::update_quantity`].
    pub async fn increment(&self, id: &LineId) -> Result<SyncOutcome, SessionError> {
        let line = self.line(id)?;

        if !line.can_increment() {
            return Err(SessionError::OutOfStock(id.clone()));
        }

        self.update_quantity(id, line.quantity + 1).await
    }

    /// Take one unit off a cart line, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns any error of [`AggregateSession::update_quantity`].
    pub async fn decrement(&self, id: &LineId) -> Result<SyncOutcome, SessionError> {
        let line = self.line(id)?;

        self.update_quantity(id, line.quantity.saturating_sub(1)).await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not in the cart, another request for the
    /// line is in flight, or the backend call fails.
    pub async fn remove_line(&self, id: &LineId) -> Result<SyncOutcome, SessionError> {
        const FAILURE: &str = "Failed to remove item";

        let line = self.line(id)?;
        let _guard = self.acquire(id.clone())?;

        let response = self
            .api
            .remove_line(LineRef::for_line(&line))
            .await
            .map_err(failed::<Cart>(FAILURE))?;

        self.settle(response, FAILURE).await
    }
}

impl AggregateSession<BuyNow> {
    /// Discard the buy-now session on the backend and tear down the local store.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] if the backend call fails; the store is left
    /// unchanged.
    pub async fn clear_aggregate(&self) -> Result<(), SessionError> {
        self.api
            .clear(Resource::BuyNow)
            .await
            .map_err(failed::<BuyNow>("Failed to clear items"))?;

        self.store().clear_aggregate();

        info!(store = BuyNow::NAME, "buy-now session cleared");

        Ok(())
    }
}

fn failed<K: StoreKind>(failure: &'static str) -> impl FnOnce(ApiError) -> SessionError {
    move |source| {
        warn!(store = K::NAME, error = %source, failure, "backend request failed");

        SessionError::api(failure)(source)
    }
}

struct BusyGuard<'a> {
    busy: &'a Mutex<FxHashSet<LineId>>,
    id: LineId,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
