//! Discount validation and revalidation protocol.
//!
//! Lifecycle of the applied discount:
//!
//! ```text
//! Absent -> Validating -> Applied -> Stale -> Revalidating -> Applied
//!                |            |                    |
//!                +-> Absent   +-> Absent (user)    +-> Absent (no longer valid)
//! ```
//!
//! A discount exists only while validated against the *current* subtotal.
//! The amount is always authority-sourced - business rules like minimum
//! order thresholds and caps live server-side, so the amount is replaced
//! wholesale on every (re)validation, never recomputed locally.
//!
//! Revalidations triggered by rapid cart mutations are coalesced by the
//! debouncer; only the last trigger within the quiescence window fires,
//! carrying the subtotal at fire time. Responses from already-dispatched
//! calls are epoch-tagged: if the subtotal changed again while the call
//! was in flight, the stale response is discarded (the newer mutation has
//! already scheduled a fresh revalidation).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use pazar_core::{CouponId, DiscountKind};

use crate::bus::Signal;
use crate::error::StorefrontError;
use crate::services::Validation;

use super::Orchestrator;

/// A coupon currently held against the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Normalized code the user entered.
    pub code: String,
    /// Authority's identifier for the coupon, used for usage recording.
    pub coupon_id: CouponId,
    /// How the amount was derived (informational).
    pub kind: DiscountKind,
    /// Authoritative discount amount for the subtotal it was validated at.
    pub amount: Decimal,
    /// Authority's human-readable message.
    pub message: String,
}

/// Observable position in the discount lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountPhase {
    Absent,
    Validating,
    Applied,
    Stale,
    Revalidating,
}

/// Internal state machine for the discount slot.
#[derive(Debug)]
pub(crate) enum DiscountState {
    /// No discount held.
    Absent,
    /// A code is being checked with the authority for the first time.
    Validating,
    /// Validated against the current subtotal.
    Applied(AppliedDiscount),
    /// Held, but the subtotal moved since validation; a revalidation is
    /// scheduled through the debouncer.
    Stale(AppliedDiscount),
    /// A revalidation dispatched at `epoch` is in flight.
    Revalidating { discount: AppliedDiscount, epoch: u64 },
}

impl DiscountState {
    /// The held discount, regardless of freshness.
    pub(crate) fn discount(&self) -> Option<&AppliedDiscount> {
        match self {
            Self::Absent | Self::Validating => None,
            Self::Applied(discount) | Self::Stale(discount) => Some(discount),
            Self::Revalidating { discount, .. } => Some(discount),
        }
    }

    pub(crate) fn phase(&self) -> DiscountPhase {
        match self {
            Self::Absent => DiscountPhase::Absent,
            Self::Validating => DiscountPhase::Validating,
            Self::Applied(_) => DiscountPhase::Applied,
            Self::Stale(_) => DiscountPhase::Stale,
            Self::Revalidating { .. } => DiscountPhase::Revalidating,
        }
    }
}

impl Orchestrator {
    /// Validate `code` against the current subtotal and hold the result.
    ///
    /// The code is trimmed and uppercased first. Applying a code replaces
    /// whatever was held before; re-entering a removed code restarts the
    /// lifecycle from scratch.
    ///
    /// # Errors
    ///
    /// `EmptyCode` for a blank code (no network call); `Unauthenticated`
    /// without a session; `CouponRejected` with the authority's reason if
    /// the code does not apply; the transport failure otherwise. A
    /// transport failure says nothing about the new code, so any discount
    /// held before the call is kept.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, code: &str) -> Result<AppliedDiscount, StorefrontError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(StorefrontError::EmptyCode);
        }
        let session = self.session()?;
        let subtotal = self.subtotal();

        let previous =
            self.with_discount(|state| std::mem::replace(state, DiscountState::Validating));

        let outcome = self
            .remotes()
            .discounts
            .validate(&code, session.user_id, subtotal)
            .await;

        match outcome {
            Ok(Validation::Valid {
                coupon_id,
                kind,
                amount,
                message,
            }) => {
                let discount = AppliedDiscount {
                    code,
                    coupon_id,
                    kind,
                    amount,
                    message,
                };
                self.with_discount(|state| *state = DiscountState::Applied(discount.clone()));
                Ok(discount)
            }
            Ok(Validation::Invalid { message }) => {
                self.with_discount(|state| *state = DiscountState::Absent);
                Err(StorefrontError::CouponRejected(message))
            }
            Err(e) => {
                let restored = match previous.discount().cloned() {
                    Some(discount) => DiscountState::Applied(discount),
                    None => DiscountState::Absent,
                };
                self.with_discount(|state| *state = restored);
                Err(StorefrontError::Remote(e))
            }
        }
    }

    /// Drop the held discount.
    ///
    /// No network call: an unredeemed discount carries no remote record to
    /// clean up. Any pending revalidation is cancelled.
    #[instrument(skip(self))]
    pub fn remove_coupon(&self) {
        self.cancel_pending_revalidation();
        self.with_discount(|state| *state = DiscountState::Absent);
    }

    /// Debounce target: re-check the held discount against the subtotal at
    /// fire time.
    ///
    /// Still valid: the amount is replaced with the freshly returned value.
    /// No longer valid: the discount is cleared, the authority's reason is
    /// left for [`Orchestrator::take_discount_notice`], and widgets are
    /// nudged to re-read totals. Transport errors keep the old discount.
    pub(crate) async fn run_revalidation(&self) {
        let Ok(session) = self.session() else {
            debug!("skipping coupon revalidation: no session");
            return;
        };

        let epoch = self.current_epoch();
        let subtotal = self.subtotal();
        let Some(discount) = self.with_discount(|state| {
            state.discount().cloned().inspect(|discount| {
                *state = DiscountState::Revalidating {
                    discount: discount.clone(),
                    epoch,
                };
            })
        }) else {
            return;
        };

        let outcome = self
            .remotes()
            .discounts
            .validate(&discount.code, session.user_id, subtotal)
            .await;

        // Discard the response if it no longer belongs to the current
        // subtotal or the slot moved on (coupon removed, checkout done).
        let still_current = self.with_discount(|state| {
            matches!(state, DiscountState::Revalidating { epoch: e, .. } if *e == epoch)
        }) && self.current_epoch() == epoch;
        if !still_current {
            debug!(code = %discount.code, "discarding stale revalidation response");
            return;
        }

        match outcome {
            Ok(Validation::Valid {
                coupon_id,
                kind,
                amount,
                message,
            }) => {
                let refreshed = AppliedDiscount {
                    code: discount.code,
                    coupon_id,
                    kind,
                    amount,
                    message,
                };
                self.with_discount(|state| *state = DiscountState::Applied(refreshed));
            }
            Ok(Validation::Invalid { message }) => {
                self.with_discount(|state| *state = DiscountState::Absent);
                self.set_discount_notice(format!("Coupon no longer valid: {message}"));
                // Total changed; badge/summary widgets must re-read.
                self.bus().publish(Signal::CartChanged);
            }
            Err(e) => {
                // Same policy as other best-effort background work: keep
                // the held discount, log, and wait for the next trigger.
                warn!(code = %discount.code, error = %e, "coupon revalidation failed");
                self.with_discount(|state| *state = DiscountState::Applied(discount));
            }
        }
    }

    fn set_discount_notice(&self, message: String) {
        let mut notice = self
            .inner
            .discount_notice
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *notice = Some(message);
    }
}
