//! Publish/subscribe fan-out
//!
//! Used for both engine events and store snapshots. Callbacks run
//! synchronously on the emitting thread, after the emitter released its own
//! locks, so a callback may call back into the emitter.

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ListenerSet<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A set of subscribers receiving the same payloads
pub struct Listeners<T> {
    set: Arc<Mutex<ListenerSet<T>>>,
}

impl<T: 'static> Listeners<T> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            set: Arc::new(Mutex::new(ListenerSet {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback
    ///
    /// The callback stays registered until the returned `Subscription` is
    /// dropped or `unsubscribe`d.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
            let id = set.next_id;
            set.next_id += 1;
            set.entries.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<ListenerSet<T>>> = Arc::downgrade(&self.set);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(set) = weak.upgrade() {
                    let mut set = set.lock().unwrap_or_else(PoisonError::into_inner);
                    set.entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Deliver a payload to every current subscriber
    pub fn emit(&self, payload: &T) {
        let callbacks: Vec<Callback<T>> = {
            let set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
            set.entries.iter().map(|(_, cb)| cb.clone()).collect()
        };

        for callback in callbacks {
            callback(payload);
        }
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregistration handle returned by `subscribe`
///
/// Dropping it deregisters the callback.
#[must_use = "dropping a Subscription immediately deregisters the callback"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Deregister now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the callback registered for the lifetime of the emitter
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
