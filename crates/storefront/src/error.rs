//! Unified error taxonomy for the orchestrator.
//!
//! Three classes of failure, handled differently:
//!
//! - Local validation errors (`Unauthenticated`, `EmptyCode`) are rejected
//!   before any network call and have no side effects.
//! - Remote rejections (`CouponRejected`, `OrderRejected`) carry the remote
//!   service's message verbatim when available and corrupt no state.
//! - Transport/availability failures (`Remote`, `LoadFailed`) surface as a
//!   generic failure; the triggering local mutation never partially applies.
//!
//! Best-effort saga steps (usage recording, cart clearing) never produce an
//! error from this module at all - they are logged and swallowed.

use thiserror::Error;

use crate::services::RemoteError;

/// Application-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// No session; the operation requires a signed-in user.
    #[error("Not signed in")]
    Unauthenticated,

    /// A blank coupon code was submitted. Rejected before any network call.
    #[error("Coupon code is empty")]
    EmptyCode,

    /// Initial cart/catalog load failed; local state is left empty.
    #[error("Cart could not be loaded: {0}")]
    LoadFailed(#[source] RemoteError),

    /// The Discount Authority rejected the code. Message is authority-sourced.
    #[error("{0}")]
    CouponRejected(String),

    /// The Order Ledger rejected the order (validation, payment simulation).
    /// Message is the ledger's when available, otherwise generic.
    #[error("Order was not accepted: {0}")]
    OrderRejected(String),

    /// A remote call failed in transit; no local state was changed.
    #[error("Service unavailable: {0}")]
    Remote(#[from] RemoteError),
}

impl StorefrontError {
    /// Whether this error was raised before any network call.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::EmptyCode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorefrontError::CouponRejected("minimum not met".to_string());
        assert_eq!(err.to_string(), "minimum not met");

        let err = StorefrontError::OrderRejected("payment declined".to_string());
        assert_eq!(err.to_string(), "Order was not accepted: payment declined");
    }

    #[test]
    fn test_local_classification() {
        assert!(StorefrontError::Unauthenticated.is_local());
        assert!(StorefrontError::EmptyCode.is_local());
        assert!(!StorefrontError::CouponRejected(String::new()).is_local());
    }
}
