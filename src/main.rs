//! hotkey-hookd: watch a global hotkey and report presses
//!
//! Loads the native keyboard-hook library, registers the configured hotkey
//! and prints one JSON line per press on stdout. Logs go to stderr.

mod cli;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hotkey_hook::lifecycle::ShutdownSignal;
use hotkey_hook::{
    Config, DryRunBackend, GlobalKeyboardHook, HotkeyBackend, HotkeyEvent, NativeLibrary,
};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hotkey-hookd starting");

    let mut config = Config::load().context("failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;
    info!(
        libraries = ?config.library_names,
        poll_ms = config.poll_interval.as_millis() as u64,
        "configuration loaded"
    );

    let dry_run = cli.dry_run.then(|| Arc::new(DryRunBackend::new()));
    let backend: Arc<dyn HotkeyBackend> = match &dry_run {
        Some(backend) => {
            warn!("dry-run mode: no native library loaded, each stdin line simulates a press");
            backend.clone()
        }
        None => Arc::new(
            NativeLibrary::load_first(&config.library_names, config.library_dir.as_deref())
                .context("failed to load keyboard hook library")?,
        ),
    };

    let hook = GlobalKeyboardHook::with_backend(backend).with_poll_interval(config.poll_interval);

    match config.binding {
        Some(hotkey) => hook.set_hotkey(hotkey).context("failed to register hotkey")?,
        None => warn!("no hotkey binding configured, relying on the library's current registration"),
    }

    hook.add_listener(|event: &HotkeyEvent| {
        if let Err(e) = write_event_line(event) {
            warn!(error = %e, "failed to write event to stdout");
        }
    });
    let (_, mut events) = hook.subscribe(64);

    hook.start()?;
    info!("hook started, entering main loop");

    let shutdown = ShutdownSignal::new();
    let simulate = async {
        match &dry_run {
            Some(backend) => simulate_presses(backend).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = shutdown.wait() => {
            result.context("failed to listen for shutdown signals")?;
            info!("shutdown signal received");
        }

        _ = async {
            while let Some(event) = events.recv().await {
                info!(%event, "hotkey event");
            }
        } => {
            info!("event stream closed");
        }

        result = simulate => {
            result?;
        }
    }

    info!("shutting down...");

    // Waits for the poll thread to reset the hotkey in the library.
    tokio::task::block_in_place(|| hook.stop_and_join());

    info!("hotkey-hookd stopped");

    Ok(())
}

/// Print `event` as one JSON line on stdout
fn write_event_line(event: &HotkeyEvent) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, event)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}

/// Trigger one simulated press per line read from stdin
async fn simulate_presses(backend: &DryRunBackend) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while lines
        .next_line()
        .await
        .context("failed to read stdin")?
        .is_some()
    {
        backend.trigger();
    }

    info!("stdin closed, no more simulated presses");
    std::future::pending::<()>().await;
    Ok(())
}
