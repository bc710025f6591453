//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HookError, Result};
use crate::hook::DEFAULT_POLL_INTERVAL;
use crate::hotkey::Hotkey;
use crate::native::DEFAULT_LIBRARY_NAMES;

pub const ENV_LIBRARIES: &str = "HOTKEY_HOOK_LIBRARIES";
pub const ENV_LIBRARY_DIR: &str = "HOTKEY_HOOK_LIBRARY_DIR";
pub const ENV_POLL_MS: &str = "HOTKEY_HOOK_POLL_MS";
pub const ENV_BINDING: &str = "HOTKEY_HOOK_BINDING";

/// Hook configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Library names or paths, tried in order
    pub library_names: Vec<String>,

    /// Directory bare library names are looked up in; OS search path if unset
    pub library_dir: Option<PathBuf>,

    /// Interval between checks of the native library
    pub poll_interval: Duration,

    /// Hotkey to register at startup
    pub binding: Option<Hotkey>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_names: DEFAULT_LIBRARY_NAMES.iter().map(|s| s.to_string()).collect(),
            library_dir: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            binding: None,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from defaults overridden by `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(names) = get(ENV_LIBRARIES) {
            config.library_names = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(dir) = get(ENV_LIBRARY_DIR) {
            config.library_dir = Some(PathBuf::from(dir.trim()));
        }

        if let Some(ms) = get(ENV_POLL_MS) {
            config.poll_interval = parse_poll_ms(&ms)?;
        }

        if let Some(binding) = get(ENV_BINDING) {
            config.binding = Some(binding.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the hook relies on
    pub fn validate(&self) -> Result<()> {
        if self.library_names.is_empty() {
            return Err(HookError::Config("no library names configured".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(HookError::Config("poll interval must be positive".into()));
        }
        Ok(())
    }
}

/// Parse a poll interval given in milliseconds
pub fn parse_poll_ms(value: &str) -> Result<Duration> {
    let ms: u64 = value
        .trim()
        .parse()
        .map_err(|_| HookError::Config(format!("invalid poll interval: {value:?}")))?;
    if ms == 0 {
        return Err(HookError::Config("poll interval must be positive".into()));
    }
    Ok(Duration::from_millis(ms))
}
