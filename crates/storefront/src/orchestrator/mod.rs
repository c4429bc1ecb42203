//! The storefront orchestrator.
//!
//! Owns the local [`CartState`] and the applied discount, mediates every
//! call to the remote services, runs the discount revalidation protocol
//! and the checkout saga, and publishes to the notification bus on state
//! changes.
//!
//! # Mutation policy
//!
//! Remote calls are authoritative. A mutation is applied to local state
//! only after its remote call succeeds; on failure local state is left
//! untouched and the error is surfaced. This prevents local and remote
//! truth from diverging on failure.

mod checkout;
mod discount;

pub use checkout::CheckoutDraft;
pub use discount::{AppliedDiscount, DiscountPhase};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use tracing::instrument;

use pazar_core::{CartLine, ProductId, order_total};

use crate::bus::{NotificationBus, Signal};
use crate::config::StorefrontConfig;
use crate::debounce::Debouncer;
use crate::error::StorefrontError;
use crate::services::{
    CartStore, CartStoreClient, CatalogClient, CatalogSnapshot, CouponServiceClient,
    DiscountAuthority, OrderLedger, OrderLedgerClient, ProductCatalog, UsageRecorder,
};
use crate::session::{Session, SessionStore};

use discount::DiscountState;

/// The remote service handles the orchestrator talks through.
///
/// Trait objects so tests can drive the orchestrator with in-process
/// fakes. [`Remotes::over_gateway`] wires the production HTTP clients.
#[derive(Clone)]
pub struct Remotes {
    pub cart: Arc<dyn CartStore>,
    pub discounts: Arc<dyn DiscountAuthority>,
    pub orders: Arc<dyn OrderLedger>,
    pub usage: Arc<dyn UsageRecorder>,
    pub catalog: Arc<dyn ProductCatalog>,
}

impl Remotes {
    /// Production clients for the gateway in `config`.
    ///
    /// The coupon client serves as both Discount Authority and Usage
    /// Recorder; the coupon service hosts both endpoints.
    #[must_use]
    pub fn over_gateway(config: &StorefrontConfig) -> Self {
        let coupons = CouponServiceClient::new(config);
        Self {
            cart: Arc::new(CartStoreClient::new(config)),
            discounts: Arc::new(coupons.clone()),
            orders: Arc::new(OrderLedgerClient::new(config)),
            usage: Arc::new(coupons),
            catalog: Arc::new(CatalogClient::new(config)),
        }
    }
}

/// Locally cached cart: lines, the catalog snapshot pricing them, and the
/// derived subtotal.
///
/// The subtotal is recomputed synchronously whenever lines or catalog
/// change; a stale derived value is never readable.
#[derive(Debug, Default)]
pub(crate) struct CartState {
    lines: Vec<CartLine>,
    catalog: CatalogSnapshot,
    subtotal: Decimal,
}

impl CartState {
    fn recompute_subtotal(&mut self) {
        self.subtotal = self
            .lines
            .iter()
            .map(|line| self.catalog.price_of(line.product_id) * Decimal::from(line.quantity))
            .sum();
    }

    fn replace(&mut self, lines: Vec<CartLine>, catalog: CatalogSnapshot) {
        self.lines = lines;
        self.catalog = catalog;
        self.recompute_subtotal();
    }

    /// Apply a signed delta to a line, creating or removing it as needed.
    fn apply_delta(&mut self, product_id: ProductId, delta: i32) {
        if let Some(position) = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
        {
            if let Some(line) = self.lines.get_mut(position) {
                let quantity = i64::from(line.quantity) + i64::from(delta);
                if quantity <= 0 {
                    self.lines.remove(position);
                } else {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                }
            }
        } else if delta > 0 {
            let quantity = u32::try_from(delta).unwrap_or(u32::MAX);
            self.lines.push(CartLine::new(product_id, quantity));
        }
        self.recompute_subtotal();
    }

    fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
        self.recompute_subtotal();
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.subtotal = Decimal::ZERO;
    }
}

/// Cart/discount/checkout orchestrator.
///
/// Cheaply cloneable; all clones share the same state. `CartState` and the
/// discount slot are exclusively owned here - widgets observe derived
/// values through the bus signal plus a fresh read, never through shared
/// mutable references.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

pub(crate) struct OrchestratorInner {
    config: StorefrontConfig,
    remotes: Remotes,
    sessions: SessionStore,
    bus: NotificationBus,
    cart: Mutex<CartState>,
    pub(crate) discount: Mutex<DiscountState>,
    /// Bumped on every subtotal-changing event; used to discard stale
    /// revalidation responses.
    pub(crate) epoch: AtomicU64,
    debouncer: Debouncer,
    /// Message for the user when a background revalidation cleared or
    /// changed the discount; consumed by the next `take_discount_notice`.
    pub(crate) discount_notice: Mutex<Option<String>>,
}

impl Orchestrator {
    /// Create an orchestrator over the given remotes, session store, and bus.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        remotes: Remotes,
        sessions: SessionStore,
        bus: NotificationBus,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                config,
                remotes,
                sessions,
                bus,
                cart: Mutex::new(CartState::default()),
                discount: Mutex::new(DiscountState::Absent),
                epoch: AtomicU64::new(0),
                debouncer: Debouncer::new(),
                discount_notice: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached cart lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.with_cart(|cart| cart.lines.clone())
    }

    /// Subtotal before any discount. Always >= 0.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.with_cart(|cart| cart.subtotal)
    }

    /// Total item count (sum of quantities), for badge widgets.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.with_cart(|cart| cart.lines.iter().map(|line| line.quantity).sum())
    }

    /// Payable total: subtotal minus any applied discount, clamped at zero.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        let discount = self
            .applied_discount()
            .map_or(Decimal::ZERO, |discount| discount.amount);
        order_total(subtotal, discount)
    }

    /// The discount currently held against the cart, if any.
    #[must_use]
    pub fn applied_discount(&self) -> Option<AppliedDiscount> {
        self.with_discount(|state| state.discount().cloned())
    }

    /// Where the discount lifecycle currently stands.
    #[must_use]
    pub fn discount_phase(&self) -> DiscountPhase {
        self.with_discount(|state| state.phase())
    }

    /// Consume the pending user notice from a background revalidation, if
    /// one was produced (e.g., "minimum order no longer met").
    #[must_use]
    pub fn take_discount_notice(&self) -> Option<String> {
        let mut notice = self
            .inner
            .discount_notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        notice.take()
    }

    // =========================================================================
    // Cart state synchronization
    // =========================================================================

    /// Fetch cart lines and the catalog snapshot needed to price them,
    /// then rebuild local state.
    ///
    /// The two reads are independent and are issued concurrently.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a session; `LoadFailed` on any transport
    /// error, in which case local state is left empty.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), StorefrontError> {
        let session = self.require_session()?;

        let fetched = tokio::try_join!(
            self.inner.remotes.cart.fetch_lines(&session),
            self.inner.remotes.catalog.snapshot(),
        );

        match fetched {
            Ok((lines, catalog)) => {
                self.with_cart(|cart| cart.replace(lines, catalog));
                Ok(())
            }
            Err(e) => {
                self.with_cart(CartState::clear);
                Err(StorefrontError::LoadFailed(e))
            }
        }
    }

    /// Change a line's quantity by `delta` (negative to decrement).
    ///
    /// The remote call must succeed first; only then is the cached line
    /// updated (and removed if it reaches zero). On failure local state is
    /// untouched.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a session; the remote failure otherwise.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        product_id: ProductId,
        delta: i32,
    ) -> Result<(), StorefrontError> {
        let session = self.require_session()?;

        self.inner
            .remotes
            .cart
            .adjust(&session, product_id, delta)
            .await?;

        self.with_cart(|cart| cart.apply_delta(product_id, delta));
        self.after_cart_mutation();
        Ok(())
    }

    /// Remove a line outright.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a session; the remote failure otherwise.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, product_id: ProductId) -> Result<(), StorefrontError> {
        let session = self.require_session()?;

        self.inner
            .remotes
            .cart
            .remove_line(&session, product_id)
            .await?;

        self.with_cart(|cart| cart.remove(product_id));
        self.after_cart_mutation();
        Ok(())
    }

    /// Post-mutation bookkeeping, in order: notify widgets, mark any held
    /// discount stale, and (re)arm the revalidation debounce.
    fn after_cart_mutation(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.bus.publish(Signal::CartChanged);

        let holding_discount = self.with_discount(|state| {
            if let Some(discount) = state.discount().cloned() {
                *state = DiscountState::Stale(discount);
                true
            } else {
                false
            }
        });

        if holding_discount {
            let orchestrator = self.clone();
            self.inner
                .debouncer
                .schedule(self.inner.config.revalidate_debounce, async move {
                    orchestrator.run_revalidation().await;
                });
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_session(&self) -> Result<Session, StorefrontError> {
        self.inner
            .sessions
            .current()
            .ok_or(StorefrontError::Unauthenticated)
    }

    fn with_cart<T>(&self, f: impl FnOnce(&mut CartState) -> T) -> T {
        let mut cart = self
            .inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    pub(crate) fn with_discount<T>(&self, f: impl FnOnce(&mut DiscountState) -> T) -> T {
        let mut discount = self
            .inner
            .discount
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut discount)
    }

    pub(crate) fn bus(&self) -> &NotificationBus {
        &self.inner.bus
    }

    pub(crate) fn remotes(&self) -> &Remotes {
        &self.inner.remotes
    }

    pub(crate) fn current_epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_pending_revalidation(&self) {
        self.inner.debouncer.cancel();
    }

    pub(crate) fn session(&self) -> Result<Session, StorefrontError> {
        self.require_session()
    }

    pub(crate) fn read_cart<T>(&self, f: impl FnOnce(&CartState) -> T) -> T {
        self.with_cart(|cart| f(cart))
    }

    pub(crate) fn clear_cart_locally(&self) {
        self.with_cart(CartState::clear);
    }
}

impl CartState {
    pub(crate) fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub(crate) fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub(crate) const fn subtotal(&self) -> Decimal {
        self.subtotal
    }
}
