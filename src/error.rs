//! Error types shared across the hook, loader and binding parser

use thiserror::Error;

/// Errors that can occur while loading, configuring or running the hook
#[derive(Debug, Error)]
pub enum HookError {
    #[error("keyboard hook is already running")]
    AlreadyRunning,

    #[error("failed to spawn poll thread: {0}")]
    ThreadSpawn(String),

    #[error("native library rejected hotkey {0}")]
    HotkeyRejected(String),

    #[error("no keyboard hook library could be loaded (tried: {})", .tried.join(", "))]
    NoLibraryLoaded { tried: Vec<String> },

    #[error("invalid hotkey binding: {0}")]
    InvalidBinding(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_library_message_lists_candidates() {
        let err = HookError::NoLibraryLoaded {
            tried: vec!["JKeyboardHook32.dll".into(), "JKeyboardHook64.dll".into()],
        };
        assert_eq!(
            err.to_string(),
            "no keyboard hook library could be loaded (tried: JKeyboardHook32.dll, JKeyboardHook64.dll)"
        );
    }
}
