//! Current identity for the acting user.
//!
//! Session issuance (login, token refresh) is outside this crate; the
//! orchestrator only needs a read of "who is acting, with what token".
//! The store publishes an identity-changed signal on sign-in/sign-out so
//! greeting and badge widgets can refresh.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};

use pazar_core::UserId;

use crate::bus::{NotificationBus, Signal};

/// An authenticated identity: user plus bearer token.
#[derive(Clone)]
pub struct Session {
    /// The acting user.
    pub user_id: UserId,
    /// Bearer token presented to the gateway.
    token: SecretString,
}

impl Session {
    /// Create a session from an externally issued token.
    #[must_use]
    pub fn new(user_id: UserId, token: SecretString) -> Self {
        Self { user_id, token }
    }

    /// The raw bearer token, for building Authorization headers.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Shared holder for the current session.
///
/// Cheaply cloneable; all clones observe the same identity. Writes publish
/// [`Signal::IdentityChanged`] so widgets re-read.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    bus: NotificationBus,
}

impl SessionStore {
    /// Create an empty store wired to the given bus.
    #[must_use]
    pub fn new(bus: NotificationBus) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            bus,
        }
    }

    /// Install a session (after external login) and notify widgets.
    pub fn sign_in(&self, session: Session) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(session);
        }
        self.bus.publish(Signal::IdentityChanged);
    }

    /// Clear the session and notify widgets.
    pub fn sign_out(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
        self.bus.publish(Signal::IdentityChanged);
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }
}
