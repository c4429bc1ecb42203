//! Checkout saga.
//!
//! A linear, non-resumable sequence with one hard gate and two
//! best-effort steps:
//!
//! 1. Build a draft: snapshot each line's name/price/quantity at this
//!    instant, plus subtotal, discount, and total.
//! 2. Create the order - the sole commit point. Failure aborts the saga:
//!    no further steps run, local state is untouched, and the ledger's
//!    message (or a generic one) is surfaced.
//! 3. Record discount usage - best-effort, only when a discount was in
//!    the draft. Failure is logged and swallowed: the order is already
//!    the ledger's authoritative record, and re-running step 2 would
//!    duplicate the purchase.
//! 4. Clear the remote cart - best-effort, logged and swallowed.
//! 5. Finalize: empty the local cart, clear the discount, notify
//!    widgets, hand back the order id.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use pazar_core::{OrderId, order_total};

use crate::bus::Signal;
use crate::error::StorefrontError;
use crate::services::{OrderItemSnapshot, OrderSubmission, PaymentFields, RemoteError};

use super::discount::{AppliedDiscount, DiscountState};
use super::Orchestrator;

/// Ephemeral snapshot built at the moment "pay" is invoked.
///
/// Lives only for the single saga run; discarded on both success and hard
/// failure. Snapshotting here is what keeps a placed order's recorded
/// values immune to later catalog changes.
#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub items: Vec<OrderItemSnapshot>,
    pub subtotal: Decimal,
    pub discount: Option<AppliedDiscount>,
    pub total: Decimal,
}

impl Orchestrator {
    /// Run the checkout saga and return the new order's id.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without a session. `OrderRejected` with the
    /// ledger's message when order creation is refused; the transport
    /// failure when it is unreachable. In every error case local
    /// `CartState` and the applied discount are exactly as they were
    /// before the call.
    #[instrument(skip(self, payment))]
    pub async fn checkout(
        &self,
        payment: PaymentFields,
        shipping_address: String,
    ) -> Result<OrderId, StorefrontError> {
        let session = self.session()?;

        // Step 1: draft. Everything after the hard gate works off this
        // snapshot, never off live state.
        let draft = self.build_draft();

        let submission = OrderSubmission {
            user_id: session.user_id,
            items: draft.items.clone(),
            sub_total: draft.subtotal,
            total_price: draft.total,
            coupon_code: draft
                .discount
                .as_ref()
                .map(|discount| discount.code.clone())
                .unwrap_or_default(),
            coupon_discount: draft
                .discount
                .as_ref()
                .map_or(Decimal::ZERO, |discount| discount.amount),
            payment,
            shipping_address,
        };

        // Step 2: the hard gate.
        let order_id = self
            .remotes()
            .orders
            .create(&submission)
            .await
            .map_err(reject_or_transport)?;
        info!(%order_id, "order created");

        // Step 3: best-effort usage recording.
        if let Some(discount) = &draft.discount {
            if let Err(e) = self
                .remotes()
                .usage
                .record(discount.coupon_id, session.user_id, order_id, discount.amount)
                .await
            {
                warn!(%order_id, code = %discount.code, error = %e,
                    "discount usage not recorded");
            }
        }

        // Step 4: best-effort remote cart clear.
        if let Err(e) = self.remotes().cart.clear(&session).await {
            warn!(%order_id, error = %e, "remote cart not cleared");
        }

        // Step 5: finalize regardless of steps 3-4.
        self.cancel_pending_revalidation();
        self.clear_cart_locally();
        self.with_discount(|state| *state = DiscountState::Absent);
        self.bus().publish(Signal::CartChanged);

        Ok(order_id)
    }

    /// Snapshot the cart and discount for one saga run.
    #[must_use]
    pub fn build_draft(&self) -> CheckoutDraft {
        let (items, subtotal) = self.read_cart(|cart| {
            let items = cart
                .lines()
                .iter()
                .map(|line| {
                    let product = cart.catalog().get(line.product_id);
                    OrderItemSnapshot {
                        product_id: line.product_id,
                        product_name: product.map_or_else(
                            || format!("Product #{}", line.product_id),
                            |product| product.name.clone(),
                        ),
                        unit_price: product.map_or(Decimal::ZERO, |product| product.price),
                        quantity: line.quantity,
                    }
                })
                .collect();
            (items, cart.subtotal())
        });

        let discount = self.applied_discount();
        let total = order_total(
            subtotal,
            discount
                .as_ref()
                .map_or(Decimal::ZERO, |discount| discount.amount),
        );

        CheckoutDraft {
            items,
            subtotal,
            discount,
            total,
        }
    }
}

/// Map a ledger failure: surface its message verbatim when it sent one,
/// otherwise the generic transport error.
fn reject_or_transport(error: RemoteError) -> StorefrontError {
    match error.remote_message() {
        Some(message) => StorefrontError::OrderRejected(message.to_string()),
        None => StorefrontError::Remote(error),
    }
}
