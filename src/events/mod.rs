//! Events delivered to hotkey listeners
//!
//! One event is produced per activation reported by the native library.

use serde::{Deserialize, Serialize};

use crate::hotkey::Hotkey;

/// A single hotkey activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyEvent {
    /// Activation count since the hook was created, starting at 1
    pub sequence: u64,

    /// Hotkey registered at the time of the press, if it was set through the hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<Hotkey>,

    /// Milliseconds since the poll loop was started
    pub elapsed_ms: u64,
}

impl std::fmt::Display for HotkeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hotkey {
            Some(hotkey) => write!(
                f,
                "HOTKEY_PRESSED #{} {} (+{}ms)",
                self.sequence, hotkey, self.elapsed_ms
            ),
            None => write!(f, "HOTKEY_PRESSED #{} (+{}ms)", self.sequence, self.elapsed_ms),
        }
    }
}
