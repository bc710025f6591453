//! Process lifecycle helpers for the daemon

mod shutdown;

pub use shutdown::ShutdownSignal;
