//! Dry-run backend: simulated presses without a native library

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::HotkeyBackend;
use crate::hotkey::Hotkey;

/// In-process backend with no native hook behind it
///
/// Presses are queued with [`trigger`](Self::trigger) and reported one per
/// `check_hotkey` call, the way the native library reports a pending press.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    pending: AtomicU64,
    hotkey: Mutex<Option<Hotkey>>,
    resets: AtomicUsize,
    reject_set: AtomicBool,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one simulated press
    pub fn trigger(&self) {
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(pending, "dry-run hotkey triggered");
    }

    /// Presses not yet picked up by `check_hotkey`
    pub fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Hotkey most recently accepted by `set_hotkey`, cleared by reset
    pub fn hotkey(&self) -> Option<Hotkey> {
        *self.hotkey.lock()
    }

    /// Number of `reset_hotkey` calls so far
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Make subsequent `set_hotkey` calls fail
    pub fn set_rejecting(&self, reject: bool) {
        self.reject_set.store(reject, Ordering::SeqCst);
    }
}

impl HotkeyBackend for DryRunBackend {
    fn check_hotkey(&self) -> bool {
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn set_hotkey(&self, hotkey: &Hotkey) -> bool {
        if self.reject_set.load(Ordering::SeqCst) {
            return false;
        }
        *self.hotkey.lock() = Some(*hotkey);
        true
    }

    fn reset_hotkey(&self) {
        self.hotkey.lock().take();
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_one_press_per_call() {
        let backend = DryRunBackend::new();
        assert!(!backend.check_hotkey());

        backend.trigger();
        backend.trigger();
        assert_eq!(backend.pending(), 2);
        assert!(backend.check_hotkey());
        assert!(backend.check_hotkey());
        assert!(!backend.check_hotkey());
    }

    #[test]
    fn test_set_and_reset() {
        let backend = DryRunBackend::new();
        let hotkey: Hotkey = "Ctrl+Alt+H".parse().unwrap();

        assert!(backend.set_hotkey(&hotkey));
        assert_eq!(backend.hotkey(), Some(hotkey));

        backend.reset_hotkey();
        assert_eq!(backend.hotkey(), None);
        assert_eq!(backend.reset_count(), 1);
    }

    #[test]
    fn test_rejecting_set() {
        let backend = DryRunBackend::new();
        backend.set_rejecting(true);
        assert!(!backend.set_hotkey(&"Alt+X".parse().unwrap()));
        assert_eq!(backend.hotkey(), None);
    }
}
