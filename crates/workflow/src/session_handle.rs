//! Caller-owned handle to one inventory session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stocktake_inventory::InventorySession;

/// Shared handle to an [`InventorySession`].
///
/// The caller constructs it and passes clones to the navigator and to whatever
/// presents the session. The lock is only ever held for synchronous state
/// transitions, never across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<InventorySession>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_session(session: InventorySession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session, recovering the guard if a previous holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, InventorySession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against the session.
    pub fn read<R>(&self, f: impl FnOnce(&InventorySession) -> R) -> R {
        f(&self.lock())
    }
}
