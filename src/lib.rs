//! hotkey-hook: global hotkey detection for host applications
//!
//! Hotkey detection itself lives in a native keyboard-hook library that
//! exposes three entry points (check, set, reset). This crate provides:
//! - A loader that tries each configured library name in turn
//! - A poll thread that asks the library whether the hotkey fired
//! - A listener registry notified on every activation
//!
//! ```no_run
//! use hotkey_hook::{GlobalKeyboardHook, HotkeyEvent, NativeLibrary, DEFAULT_LIBRARY_NAMES};
//!
//! # fn main() -> hotkey_hook::Result<()> {
//! let library = NativeLibrary::load_first(&DEFAULT_LIBRARY_NAMES, None)?;
//! let hook = GlobalKeyboardHook::new(library);
//! hook.set_hotkey("Ctrl+Alt+F12".parse()?)?;
//! hook.add_listener(|event: &HotkeyEvent| println!("{event}"));
//! hook.start()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod hook;
pub mod hotkey;
pub mod lifecycle;
pub mod listeners;
pub mod native;

pub use config::Config;
pub use error::{HookError, Result};
pub use events::HotkeyEvent;
pub use hook::{GlobalKeyboardHook, DEFAULT_POLL_INTERVAL};
pub use hotkey::{Hotkey, Modifiers};
pub use listeners::{ChannelListener, HotkeyListener, ListenerId, ListenerRegistry};
pub use native::{DryRunBackend, HotkeyBackend, NativeLibrary, DEFAULT_LIBRARY_NAMES};
