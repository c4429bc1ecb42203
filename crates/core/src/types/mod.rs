//! Core types for Pazar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod money;

pub use cart::{CartLine, DiscountKind};
pub use id::*;
pub use money::order_total;
