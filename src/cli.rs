use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use hotkey_hook::config::parse_poll_ms;
use hotkey_hook::{Config, Hotkey};

/// Watch a global hotkey and print one JSON line per press
#[derive(Parser, Debug)]
#[command(name = "hotkey-hookd", version)]
pub struct Cli {
    /// Hotkey to register, e.g. "Ctrl+Alt+F12"
    #[arg(short, long)]
    pub binding: Option<Hotkey>,

    /// Milliseconds between checks of the hook library
    #[arg(long = "poll-ms", value_name = "MS", value_parser = parse_poll_ms)]
    pub poll_interval: Option<Duration>,

    /// Library name or path to load; repeat to try several in order
    #[arg(short, long = "library", value_name = "NAME")]
    pub libraries: Vec<String>,

    /// Directory to look for bare library names in
    #[arg(long, value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    /// Run without a native library; each line on stdin simulates a press
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Override configuration values given on the command line
    pub fn apply(&self, config: &mut Config) {
        if let Some(binding) = self.binding {
            config.binding = Some(binding);
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }
        if !self.libraries.is_empty() {
            config.library_names = self.libraries.clone();
        }
        if let Some(dir) = &self.library_dir {
            config.library_dir = Some(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "hotkey-hookd",
            "--binding",
            "Ctrl+Shift+F5",
            "--poll-ms",
            "20",
            "-l",
            "a",
            "-l",
            "b",
            "--library-dir",
            "/opt/hooks",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.binding, Some("Ctrl+Shift+F5".parse().unwrap()));
        assert_eq!(config.poll_interval, Duration::from_millis(20));
        assert_eq!(config.library_names, vec!["a", "b"]);
        assert_eq!(config.library_dir, Some(PathBuf::from("/opt/hooks")));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["hotkey-hookd", "--dry-run"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
        assert!(cli.dry_run);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["hotkey-hookd", "--binding", "Ctrl+"]).is_err());
        assert!(Cli::try_parse_from(["hotkey-hookd", "--poll-ms", "0"]).is_err());
    }
}
