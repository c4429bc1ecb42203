//! Money math shared by the orchestrator and checkout drafts.
//!
//! Amounts are `rust_decimal::Decimal` throughout; floats never touch
//! monetary values inside the process (the gateway wire format is JSON
//! numbers, handled at the serde boundary).

use rust_decimal::Decimal;

/// Compute the payable total for an order.
///
/// A discount can never drive the total negative: the result is clamped at
/// zero. This is the one invariant every price display and every checkout
/// draft must satisfy.
#[must_use]
pub fn order_total(subtotal: Decimal, discount: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_subtracts_discount() {
        assert_eq!(
            order_total(Decimal::from(1000), Decimal::from(100)),
            Decimal::from(900)
        );
    }

    #[test]
    fn test_total_never_negative() {
        assert_eq!(
            order_total(Decimal::from(50), Decimal::from(100)),
            Decimal::ZERO
        );
        assert_eq!(order_total(Decimal::ZERO, Decimal::from(10)), Decimal::ZERO);
    }

    #[test]
    fn test_zero_discount_is_identity() {
        let subtotal = Decimal::new(14990, 2);
        assert_eq!(order_total(subtotal, Decimal::ZERO), subtotal);
    }
}
