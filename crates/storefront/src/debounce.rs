//! Cancellable delayed task used to coalesce bursts of events.
//!
//! Scheduling replaces any pending task; only the last task scheduled
//! within the quiescence window actually fires. Cancellation only affects
//! tasks still waiting out their delay - a future whose delay has elapsed
//! runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

impl Pending {
    /// Abort only while still waiting out the delay. A task that already
    /// started is left to finish; its effect is the caller's to discard.
    fn abort_if_waiting(&self) {
        if !self.fired.load(Ordering::SeqCst) {
            self.handle.abort();
        }
    }
}

/// Reset-on-reschedule delayed task runner.
///
/// Each call to [`Debouncer::schedule`] aborts the previously scheduled
/// task (if it has not fired yet) and arms a new one.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<Pending>>,
}

impl Debouncer {
    /// Create a debouncer with no pending task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `task` to run after `delay`, replacing any pending task.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_in_task = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired_in_task.store(true, Ordering::SeqCst);
            task.await;
        });

        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.replace(Pending { handle, fired }) {
                previous.abort_if_waiting();
            }
        }
    }

    /// Drop any still-waiting task without running it.
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort_if_waiting();
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
