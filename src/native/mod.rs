//! Backends that answer the three hotkey entry points
//!
//! The real detection lives in a native keyboard-hook library reached through
//! [`NativeLibrary`]. [`DryRunBackend`] stands in for it when no library is
//! available.

mod dry_run;
mod library;

pub use dry_run::DryRunBackend;
pub use library::{candidate_path, NativeLibrary, DEFAULT_LIBRARY_NAMES};

use crate::hotkey::Hotkey;

/// The check / set / reset surface of a keyboard-hook implementation
pub trait HotkeyBackend: Send + Sync {
    /// Returns true if the registered hotkey was pressed since the last check
    fn check_hotkey(&self) -> bool;

    /// Register `hotkey`, replacing any previous one. Returns false if refused.
    fn set_hotkey(&self, hotkey: &Hotkey) -> bool;

    /// Remove the installed hotkey
    fn reset_hotkey(&self);
}
