//! Process-wide notification bus for cross-widget signals.
//!
//! Replaces ambient global events with an explicit, typed publish/subscribe
//! channel. Publish is synchronous and fire-and-forget: every subscriber
//! registered at the moment of the publish is invoked exactly once, there
//! is no queuing, and subscribers registered afterwards never see it.
//! Callbacks run outside the registry lock, so they may subscribe,
//! unsubscribe, or publish themselves.
//!
//! Subscription is explicit: [`NotificationBus::subscribe`] returns a
//! [`Subscription`] handle that the owning widget must pass back to
//! [`NotificationBus::unsubscribe`] on teardown to avoid leaks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A state-change signal carried by the bus.
///
/// Signals carry no payload; consumers re-read authoritative state after
/// being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The cart's lines or subtotal changed.
    CartChanged,
    /// The acting identity changed (sign-in, sign-out).
    IdentityChanged,
}

type Callback = Arc<dyn Fn(Signal) + Send + Sync>;

/// Handle returned on registration, required for deregistration.
///
/// Deliberately not `Clone`: exactly one owner tears the subscription down.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
}

/// Process-wide, unordered, at-most-once-per-publish fan-out channel.
///
/// Cheaply cloneable; all clones share the same subscriber registry. The
/// bus holds no domain data, only the act of notification.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Callback>>,
}

impl NotificationBus {
    /// Create a new bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for all future publishes.
    ///
    /// The returned handle must be passed to [`Self::unsubscribe`] when the
    /// owning widget is torn down.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.insert(id, Arc::new(callback));
        }
        Subscription { id }
    }

    /// Remove a subscriber. Consumes the handle.
    pub fn unsubscribe(&self, subscription: Subscription) {
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.remove(&subscription.id);
        }
    }

    /// Synchronously notify every current subscriber.
    ///
    /// The subscriber set is snapshotted first and the registry lock is
    /// released before any callback runs.
    pub fn publish(&self, signal: Signal) {
        let callbacks: Vec<Callback> = match self.inner.subscribers.lock() {
            Ok(subscribers) => subscribers.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(signal);
        }
    }

    /// Number of live subscriptions. Mainly useful for leak checks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .map(|s| s.len())
            .unwrap_or(0)
    }
}
