//! Cart and discount wire types shared between the orchestrator and the
//! remote service clients.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A single line in the remote cart: which product, and how many.
///
/// The Cart Store is the source of truth for these; the orchestrator holds
/// a cached copy. Quantity is always greater than zero - a line that would
/// reach zero is removed instead of being persisted at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product referenced by this line.
    pub product_id: ProductId,
    /// Number of units. Always > 0.
    pub quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// How a discount amount was derived by the Discount Authority.
///
/// The amount itself is always authority-sourced; the kind is informational
/// (display and bookkeeping), never used to recompute locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Percentage of the order total (e.g., 15% off).
    Percentage,
    /// Fixed amount off the order total.
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_wire_format() {
        let line = CartLine::new(ProductId::new(3), 2);
        let json = serde_json::to_value(&line).expect("serialize");
        assert_eq!(json, serde_json::json!({"product_id": 3, "quantity": 2}));
    }

    #[test]
    fn test_discount_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&DiscountKind::Percentage).expect("serialize"),
            "\"percentage\""
        );
        let kind: DiscountKind = serde_json::from_str("\"fixed\"").expect("deserialize");
        assert_eq!(kind, DiscountKind::Fixed);
    }
}
