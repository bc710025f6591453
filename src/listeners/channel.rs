use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::HotkeyListener;
use crate::events::HotkeyEvent;

/// Listener that forwards events into a bounded tokio channel
///
/// Sending never blocks the poll thread: when the channel is full the event
/// is dropped and logged.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::Sender<HotkeyEvent>,
}

impl ChannelListener {
    pub fn new(tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self { tx }
    }

    /// Create a listener and the receiving end of its channel
    ///
    /// `capacity` is raised to one if zero; tokio channels need room for an event.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<HotkeyEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl HotkeyListener for ChannelListener {
    fn on_hotkey_pressed(&self, event: &HotkeyEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(sequence = event.sequence, "hotkey channel full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(sequence = event.sequence, "hotkey channel closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sequence: u64) -> HotkeyEvent {
        HotkeyEvent {
            sequence,
            hotkey: None,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_forwards_events() {
        let (listener, mut rx) = ChannelListener::channel(4);
        listener.on_hotkey_pressed(&event(1));
        listener.on_hotkey_pressed(&event(2));

        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert_eq!(rx.try_recv().unwrap().sequence, 2);
    }

    #[test]
    fn test_full_channel_drops_newest() {
        let (listener, mut rx) = ChannelListener::channel(1);
        listener.on_hotkey_pressed(&event(1));
        listener.on_hotkey_pressed(&event(2));

        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_zero_capacity_holds_one_event() {
        let (listener, mut rx) = ChannelListener::channel(0);
        listener.on_hotkey_pressed(&event(1));
        listener.on_hotkey_pressed(&event(2));

        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (listener, rx) = ChannelListener::channel(1);
        drop(rx);
        listener.on_hotkey_pressed(&event(1));
    }
}
