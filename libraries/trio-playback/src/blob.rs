//! Transient resource handles for in-memory audio
//!
//! Local file bytes are registered under a handle while their source is
//! active, the way a browser wraps bytes in an object URL. The engine
//! releases the previous handle before assigning a new one, so the number
//! of live handles stays bounded across track changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

/// Handle to registered bytes (`blob:trio/<n>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Handle as a URL string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of live handles
#[derive(Default)]
pub struct BlobRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<BlobHandle, Arc<[u8]>>>,
}

impl BlobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return their handle
    pub fn register(&self, bytes: Arc<[u8]>) -> BlobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = BlobHandle(format!("blob:trio/{}", id));
        trace!(handle = %handle, len = bytes.len(), "Registered blob");
        self.lock().insert(handle.clone(), bytes);
        handle
    }

    /// Bytes behind a handle, if still live
    pub fn get(&self, handle: &BlobHandle) -> Option<Arc<[u8]>> {
        self.lock().get(handle).cloned()
    }

    /// Release a handle; returns false if it was not live
    pub fn release(&self, handle: &BlobHandle) -> bool {
        let released = self.lock().remove(handle).is_some();
        if released {
            trace!(handle = %handle, "Released blob");
        }
        released
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BlobHandle, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
