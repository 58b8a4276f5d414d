//! Cart mutation client.
//!
//! [`CartService`] holds the single canonical cart and serializes every
//! mutation against the same cart identity through a FIFO queue, so rapid
//! overlapping user actions (double-clicked quantity buttons) apply in
//! submission order instead of racing each other from stale snapshots.
//!
//! Every successful backend response is converted wholesale into the
//! canonical cart; a failed operation leaves the previously held cart
//! untouched. Partial or delta updates are never applied.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use fernhollow_core::{Cart, CartId, LineId, VariantId};
use tracing::{instrument, warn};

use crate::error::CommerceError;
use crate::shopify::ShopifyError;
use crate::store::{CART_ID_KEY, StateStore};

/// One line to add to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    /// The variant to add.
    pub merchandise_id: VariantId,
    /// Units to add.
    pub quantity: u32,
}

/// The backend a cart service mutates against.
///
/// Implemented by [`crate::shopify::StorefrontClient`] and by in-memory
/// fakes in tests. Every operation returns the backend's complete cart,
/// already converted to the canonical shape.
pub trait CartBackend: Send + Sync {
    /// Create a new, empty cart.
    fn create_cart(&self) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Fetch an existing cart.
    fn get_cart(&self, cart_id: &CartId)
    -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Add lines to a cart.
    fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<NewLine>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Set one line's quantity.
    fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &LineId,
        quantity: u32,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Remove lines from a cart.
    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;
}

/// Registry of per-cart-id FIFO queues.
///
/// `tokio::sync::Mutex` is fair, so waiters acquire in request order -
/// exactly the submission-order guarantee the mutation queue needs.
#[derive(Default)]
struct MutationQueues {
    queues: Mutex<HashMap<CartId, Arc<tokio::sync::Mutex<()>>>>,
}

impl MutationQueues {
    fn for_cart(&self, cart_id: &CartId) -> Arc<tokio::sync::Mutex<()>> {
        let mut queues = match self.queues.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            queues
                .entry(cart_id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

/// The authoritative cart client.
pub struct CartService<B: CartBackend> {
    backend: B,
    store: Arc<dyn StateStore>,
    cart: Mutex<Cart>,
    queues: MutationQueues,
}

impl<B: CartBackend> CartService<B> {
    /// Initialize the service, restoring or creating the active cart.
    ///
    /// A previously stored cart id is probed exactly once. If the probe
    /// fails, the stored id is discarded and a fresh cart is created -
    /// self-healing, never surfaced as an error and never retried in a
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns an error only if creating a fresh cart fails, or the state
    /// store cannot be written.
    pub async fn init(backend: B, store: Arc<dyn StateStore>) -> Result<Self, CommerceError> {
        let stored_id = store.get(CART_ID_KEY)?.map(CartId::new);

        let cart = if let Some(id) = stored_id {
            match backend.get_cart(&id).await {
                Ok(cart) => cart,
                Err(e) => {
                    warn!(cart_id = %id, error = %e, "stored cart unusable; creating a fresh one");
                    store.remove(CART_ID_KEY)?;
                    Self::create_fresh(&backend, store.as_ref()).await?
                }
            }
        } else {
            Self::create_fresh(&backend, store.as_ref()).await?
        };

        Ok(Self {
            backend,
            store,
            cart: Mutex::new(cart),
            queues: MutationQueues::default(),
        })
    }

    async fn create_fresh(backend: &B, store: &dyn StateStore) -> Result<Cart, CommerceError> {
        let cart = backend.create_cart().await?;
        if let Some(id) = &cart.id {
            store.set(CART_ID_KEY, id.as_str())?;
        }
        Ok(cart)
    }

    /// The current canonical cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock_cart().clone()
    }

    /// Add units of a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the mutation; the held
    /// cart is unchanged in that case.
    #[instrument(skip(self), fields(merchandise = %merchandise_id))]
    pub async fn add_line(
        &self,
        merchandise_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        let cart_id = self.active_cart_id()?;
        let queue = self.queues.for_cart(&cart_id);
        let _turn = queue.lock().await;

        let lines = vec![NewLine {
            merchandise_id: merchandise_id.clone(),
            quantity,
        }];
        let cart = self.backend.add_lines(&cart_id, lines).await?;
        Ok(self.replace_cart(cart))
    }

    /// Set a line's quantity. Quantity zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the mutation; the held
    /// cart is unchanged in that case.
    #[instrument(skip(self), fields(line = %line_id))]
    pub async fn update_line(&self, line_id: &LineId, quantity: u32) -> Result<Cart, CommerceError> {
        if quantity == 0 {
            return self.remove_line(line_id).await;
        }
        let cart_id = self.active_cart_id()?;
        let queue = self.queues.for_cart(&cart_id);
        let _turn = queue.lock().await;

        let cart = self.backend.update_line(&cart_id, line_id, quantity).await?;
        Ok(self.replace_cart(cart))
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the mutation; the held
    /// cart is unchanged in that case.
    #[instrument(skip(self), fields(line = %line_id))]
    pub async fn remove_line(&self, line_id: &LineId) -> Result<Cart, CommerceError> {
        let cart_id = self.active_cart_id()?;
        let queue = self.queues.for_cart(&cart_id);
        let _turn = queue.lock().await;

        let cart = self
            .backend
            .remove_lines(&cart_id, vec![line_id.clone()])
            .await?;
        Ok(self.replace_cart(cart))
    }

    /// Explicitly re-fetch the cart from the backend.
    ///
    /// This is the only operation that changes captured line prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the held cart is unchanged.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, CommerceError> {
        let cart_id = self.active_cart_id()?;
        let queue = self.queues.for_cart(&cart_id);
        let _turn = queue.lock().await;

        let cart = self.backend.get_cart(&cart_id).await?;
        Ok(self.replace_cart(cart))
    }

    fn active_cart_id(&self) -> Result<CartId, CommerceError> {
        self.lock_cart().id.clone().ok_or_else(|| {
            CommerceError::from(ShopifyError::NotFound("no active cart".to_string()))
        })
    }

    fn replace_cart(&self, cart: Cart) -> Cart {
        let mut held = self.lock_cart();
        // The backend can hand back a different cart id (e.g. after the
        // old cart expired mid-session); keep the durable key current.
        if cart.id != held.id
            && let Some(id) = &cart.id
            && let Err(error) = self.store.set(CART_ID_KEY, id.as_str())
        {
            warn!(%error, "failed to persist reassigned cart id");
        }
        *held = cart.clone();
        drop(held);
        cart
    }

    fn lock_cart(&self) -> std::sync::MutexGuard<'_, Cart> {
        match self.cart.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingConfig;
    use crate::store::MemoryStore;
    use fernhollow_core::{CartItem, ProductId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::Duration;

    /// In-memory cart backend applying mutations to a canonical cart,
    /// with optional failure injection and a per-op delay for ordering
    /// tests.
    struct FakeBackend {
        state: Mutex<Cart>,
        pricing: PricingConfig,
        fail_next: AtomicBool,
        fail_get: AtomicBool,
        next_line: AtomicU64,
        add_delay: Mutex<Option<Duration>>,
        reassign_id: Mutex<Option<String>>,
        applied: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                state: Mutex::new(Cart::empty()),
                pricing: PricingConfig::default(),
                fail_next: AtomicBool::new(false),
                fail_get: AtomicBool::new(false),
                next_line: AtomicU64::new(1),
                add_delay: Mutex::new(None),
                reassign_id: Mutex::new(None),
                applied: Mutex::new(Vec::new()),
            }
        }

        fn snapshot(&self) -> Cart {
            self.state.lock().expect("state lock").clone()
        }

        fn take_fail(&self) -> bool {
            self.fail_next.swap(false, Ordering::SeqCst)
        }

        fn recompute(&self, cart: &mut Cart) {
            cart.totals = self.pricing.totals(&cart.items);
            cart.total_quantity = cart.items.iter().map(|i| i.quantity).sum();
        }

        fn record(&self, op: String) {
            self.applied.lock().expect("applied lock").push(op);
        }
    }

    impl CartBackend for FakeBackend {
        async fn create_cart(&self) -> Result<Cart, ShopifyError> {
            let mut cart = Cart::empty();
            cart.id = Some(CartId::new("cart-1"));
            cart.checkout_url = Some("https://shop.example/checkout/1".to_string());
            *self.state.lock().expect("state lock") = cart.clone();
            Ok(cart)
        }

        async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, ShopifyError> {
            if self.fail_get.load(Ordering::SeqCst) {
                return Err(ShopifyError::NotFound(format!("Cart not found: {cart_id}")));
            }
            Ok(self.snapshot())
        }

        async fn add_lines(
            &self,
            _cart_id: &CartId,
            lines: Vec<NewLine>,
        ) -> Result<Cart, ShopifyError> {
            let delay = *self.add_delay.lock().expect("delay lock");
            if let Some(delay) = delay {
                // Only the first add is slow.
                *self.add_delay.lock().expect("delay lock") = None;
                tokio::time::sleep(delay).await;
            }
            if self.take_fail() {
                return Err(ShopifyError::UserError("rejected".to_string()));
            }
            let mut state = self.state.lock().expect("state lock");
            for line in lines {
                self.record(format!("add:{}:{}", line.merchandise_id, line.quantity));
                let n = self.next_line.fetch_add(1, Ordering::SeqCst);
                state.items.push(CartItem {
                    line_id: Some(LineId::new(format!("line-{n}"))),
                    product_id: ProductId::new("p1"),
                    variant_id: Some(line.merchandise_id),
                    name: "Product".to_string(),
                    variant_name: None,
                    quantity: line.quantity,
                    unit_price: dec!(10.00),
                });
            }
            if let Some(new_id) = self.reassign_id.lock().expect("reassign lock").take() {
                state.id = Some(CartId::new(new_id));
            }
            self.recompute(&mut state);
            Ok(state.clone())
        }

        async fn update_line(
            &self,
            _cart_id: &CartId,
            line_id: &LineId,
            quantity: u32,
        ) -> Result<Cart, ShopifyError> {
            if self.take_fail() {
                return Err(ShopifyError::UserError("rejected".to_string()));
            }
            self.record(format!("update:{line_id}:{quantity}"));
            let mut state = self.state.lock().expect("state lock");
            if let Some(line) = state
                .items
                .iter_mut()
                .find(|i| i.line_id.as_ref() == Some(line_id))
            {
                line.quantity = quantity;
            }
            self.recompute(&mut state);
            Ok(state.clone())
        }

        async fn remove_lines(
            &self,
            _cart_id: &CartId,
            line_ids: Vec<LineId>,
        ) -> Result<Cart, ShopifyError> {
            if self.take_fail() {
                return Err(ShopifyError::UserError("rejected".to_string()));
            }
            for id in &line_ids {
                self.record(format!("remove:{id}"));
            }
            let mut state = self.state.lock().expect("state lock");
            state
                .items
                .retain(|i| i.line_id.as_ref().is_none_or(|id| !line_ids.contains(id)));
            self.recompute(&mut state);
            Ok(state.clone())
        }
    }

    async fn service() -> CartService<FakeBackend> {
        CartService::init(FakeBackend::new(), Arc::new(MemoryStore::new()))
            .await
            .expect("init")
    }

    #[tokio::test]
    async fn init_creates_and_persists_a_cart() {
        let store = Arc::new(MemoryStore::new());
        let service = CartService::init(FakeBackend::new(), Arc::clone(&store) as Arc<dyn StateStore>)
            .await
            .expect("init");
        assert_eq!(
            store.get(CART_ID_KEY).expect("get"),
            Some("cart-1".to_string())
        );
        assert!(service.cart().is_empty());
    }

    #[tokio::test]
    async fn init_self_heals_from_a_dead_stored_cart_id() {
        let store = Arc::new(MemoryStore::new());
        store.set(CART_ID_KEY, "cart-stale").expect("seed");

        let backend = FakeBackend::new();
        backend.fail_get.store(true, Ordering::SeqCst);

        // Probe fails once, the stale id is discarded, a fresh cart
        // appears - and no error surfaces.
        let service = CartService::init(backend, Arc::clone(&store) as Arc<dyn StateStore>)
            .await
            .expect("init");
        assert_eq!(
            store.get(CART_ID_KEY).expect("get"),
            Some("cart-1".to_string())
        );
        assert_eq!(service.cart().id, Some(CartId::new("cart-1")));
    }

    #[tokio::test]
    async fn successful_mutations_replace_the_cart_wholesale() {
        let service = service().await;
        let cart = service
            .add_line(&VariantId::new("v1"), 2)
            .await
            .expect("add");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_quantity, 2);
        assert!(cart.totals.is_consistent());
        assert_eq!(service.cart(), cart);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_previous_cart_untouched() {
        let service = service().await;
        service
            .add_line(&VariantId::new("v1"), 2)
            .await
            .expect("add");
        let before = service.cart();

        service.backend.fail_next.store(true, Ordering::SeqCst);
        let result = service.add_line(&VariantId::new("v2"), 1).await;
        assert!(result.is_err());
        assert_eq!(service.cart(), before);
    }

    #[tokio::test]
    async fn update_to_zero_quantity_removes_the_line() {
        let service = service().await;
        let cart = service
            .add_line(&VariantId::new("v1"), 2)
            .await
            .expect("add");
        let line_id = cart.items[0].line_id.clone().expect("line id");

        let cart = service.update_line(&line_id, 0).await.expect("update");
        assert!(cart.is_empty());
        assert_eq!(cart.totals.total, Decimal::ZERO);
        // The backend saw a remove, not a zero-quantity update.
        let applied = service.backend.applied.lock().expect("applied");
        assert!(applied.last().expect("op").starts_with("remove:"));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_mutations_apply_in_submission_order() {
        let service = Arc::new(service().await);
        *service.backend.add_delay.lock().expect("delay") = Some(Duration::from_millis(200));

        // First mutation is slow; the second must still apply after it.
        let slow = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.add_line(&VariantId::new("v-first"), 1).await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.add_line(&VariantId::new("v-second"), 2).await }
        });

        slow.await.expect("join").expect("first add");
        second.await.expect("join").expect("second add");

        let applied = service.backend.applied.lock().expect("applied").clone();
        assert_eq!(applied, vec!["add:v-first:1", "add:v-second:2"]);
        assert_eq!(service.cart().total_quantity, 3);
    }

    #[tokio::test]
    async fn reassigned_cart_id_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let backend = FakeBackend::new();
        *backend.reassign_id.lock().expect("reassign") = Some("cart-2".to_string());

        let service = CartService::init(backend, Arc::clone(&store) as Arc<dyn StateStore>)
            .await
            .expect("init");
        service
            .add_line(&VariantId::new("v1"), 1)
            .await
            .expect("add");

        assert_eq!(service.cart().id, Some(CartId::new("cart-2")));
        assert_eq!(
            store.get(CART_ID_KEY).expect("get"),
            Some("cart-2".to_string())
        );
    }

    #[tokio::test]
    async fn refresh_refetches_the_backend_cart() {
        let service = service().await;
        service
            .add_line(&VariantId::new("v1"), 1)
            .await
            .expect("add");

        // Simulate a backend-side price change; only refresh picks it up.
        service.backend.state.lock().expect("state").items[0].unit_price = dec!(12.00);
        assert_eq!(service.cart().items[0].unit_price, dec!(10.00));

        let cart = service.refresh().await.expect("refresh");
        assert_eq!(cart.items[0].unit_price, dec!(12.00));
    }
}
