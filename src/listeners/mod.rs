//! Hotkey listeners and the registry that notifies them

mod channel;
mod registry;

pub use channel::ChannelListener;
pub use registry::{HotkeyListener, ListenerId, ListenerRegistry};
