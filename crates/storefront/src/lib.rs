//! Pazar Storefront orchestration library.
//!
//! This crate is the client-side core of the storefront: it keeps a local
//! cart consistent with the remote Cart Store, keeps an applied coupon in
//! sync with a changing subtotal, and runs order creation as a multi-step
//! saga across services that offer no shared atomicity.
//!
//! Display widgets (counters, badges, pages) are not part of this crate;
//! they observe state changes through the [`bus::NotificationBus`] and
//! re-read derived values from the [`orchestrator::Orchestrator`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bus;
pub mod config;
pub mod debounce;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod session;
