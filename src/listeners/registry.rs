//! Listener registry with snapshot-based notification

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::events::HotkeyEvent;

/// Receives a callback for every hotkey activation
///
/// Callbacks run on the hook's poll thread and should return quickly; the
/// next check does not happen until every listener has returned.
pub trait HotkeyListener: Send + Sync {
    fn on_hotkey_pressed(&self, event: &HotkeyEvent);
}

impl<F> HotkeyListener for F
where
    F: Fn(&HotkeyEvent) + Send + Sync,
{
    fn on_hotkey_pressed(&self, event: &HotkeyEvent) {
        self(event)
    }
}

/// Handle returned by [`ListenerRegistry::add`], used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered collection of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn HotkeyListener>)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the same listener may be added more than once
    pub fn add<L: HotkeyListener + 'static>(&self, listener: L) -> ListenerId {
        self.add_shared(Arc::new(listener))
    }

    /// Register a listener the caller keeps a handle to
    pub fn add_shared(&self, listener: Arc<dyn HotkeyListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        debug!(listener = id.0, "listener added");
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|(lid, _)| *lid == id) {
            Some(index) => {
                listeners.remove(index);
                debug!(listener = id.0, "listener removed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Deliver `event` to every listener registered when the call started
    ///
    /// Returns how many listeners returned normally. A panicking listener is
    /// logged and skipped.
    pub fn notify(&self, event: &HotkeyEvent) -> usize {
        // Callbacks may add or remove listeners, so no lock is held while they run.
        let snapshot: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_hotkey_pressed(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    error!(listener = id.0, sequence = event.sequence, "hotkey listener panicked");
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
