//! Synchronous publish/subscribe fanout for [`MonitoringEvent`]s.
//!
//! Callbacks run on the task that received the event, in registration
//! order. A panicking callback is caught and logged; the remaining
//! callbacks still run and the registry is left untouched.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::events::MonitoringEvent;

type Callback = Arc<dyn Fn(&MonitoringEvent) + Send + Sync>;
type Registry = Mutex<Vec<(u64, Callback)>>;

/// Ordered list of event callbacks.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Arc<Registry>,
    next_id: AtomicU64,
}

/// Handle returned by [`EventDispatcher::subscribe`].
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[must_use = "dropping a Subscription keeps the callback registered forever"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Registry>,
}

impl Subscription {
    /// Remove exactly the callback this handle was created for.
    ///
    /// A no-op if the dispatcher has already been dropped.
    pub fn unsubscribe(self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            lock(&subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every dispatched event.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MonitoringEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).push((id, Arc::new(callback)));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Invoke every registered callback with `event`.
    ///
    /// The callback list is snapshotted first, so callbacks may subscribe
    /// or unsubscribe without deadlocking; such changes apply from the
    /// next event on.
    pub fn dispatch(&self, event: &MonitoringEvent) {
        let callbacks: Vec<Callback> = lock(&self.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                tracing::error!(
                    event_type = event.event_type(),
                    panic = panic_message(payload.as_ref()),
                    "Monitoring event callback panicked",
                );
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }
}

fn lock(registry: &Registry) -> std::sync::MutexGuard<'_, Vec<(u64, Callback)>> {
    // Callbacks never run under the lock, so poisoning cannot leave the
    // registry half-updated.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
