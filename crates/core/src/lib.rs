//! Pazar Core - Shared types library.
//!
//! This crate provides common types used across Pazar components:
//! - `storefront` - Client-side cart/discount/checkout orchestration
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, cart lines, and money math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
