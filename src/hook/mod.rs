//! Hook lifecycle: hotkey registration, listeners and the poll thread

mod keyboard_hook;

pub use keyboard_hook::{GlobalKeyboardHook, DEFAULT_POLL_INTERVAL};
