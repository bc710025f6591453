//! Hotkey model: virtual-key code plus modifier flags
//!
//! Parsing and display of `Ctrl+Alt+F12` style bindings.

mod keys;

pub use keys::{vk, Hotkey, Modifiers, VALID_KEY_CODES};
