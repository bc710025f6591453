//! Global keyboard hook: owns the backend, the listeners and the poll thread
//!
//! The poll thread asks the backend whether the hotkey fired, notifies every
//! listener if it did, then waits one poll interval. When asked to stop it
//! resets the hotkey in the backend and exits, unless a newer loop has been
//! started in the meantime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{HookError, Result};
use crate::events::HotkeyEvent;
use crate::hotkey::Hotkey;
use crate::listeners::{ChannelListener, HotkeyListener, ListenerId, ListenerRegistry};
use crate::native::HotkeyBackend;

/// How often the backend is asked whether the hotkey fired
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// State shared between the hook handle and its poll thread
struct Shared {
    backend: Arc<dyn HotkeyBackend>,
    listeners: ListenerRegistry,
    hotkey: Mutex<Option<Hotkey>>,
    sequence: AtomicU64,
    /// Bumped by every `start`; only the newest loop owns the registration
    generation: AtomicU64,
}

/// A running poll thread and its stop flag
struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_active(&self) -> bool {
        !self.stop.load(Ordering::SeqCst) && !self.handle.is_finished()
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.thread().unpark();
    }

    /// Stop the thread and wait for it, unless called from the thread itself
    fn finish(self) {
        self.request_stop();
        if self.handle.thread().id() == thread::current().id() {
            debug!("stop requested from the poll thread, not joining");
            return;
        }
        if self.handle.join().is_err() {
            error!("hotkey poll thread panicked");
        }
    }
}

/// Polls a [`HotkeyBackend`] on a background thread and notifies listeners
pub struct GlobalKeyboardHook {
    shared: Arc<Shared>,
    poll_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl GlobalKeyboardHook {
    /// Create a hook over `backend` with the default poll interval
    pub fn new<B: HotkeyBackend + 'static>(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create a hook over a backend the caller also holds on to
    pub fn with_backend(backend: Arc<dyn HotkeyBackend>) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                listeners: ListenerRegistry::new(),
                hotkey: Mutex::new(None),
                sequence: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
            poll_interval: DEFAULT_POLL_INTERVAL,
            worker: Mutex::new(None),
        }
    }

    /// Change the poll interval used by subsequent `start` calls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn add_listener<L: HotkeyListener + 'static>(&self, listener: L) -> ListenerId {
        self.shared.listeners.add(listener)
    }

    pub fn add_shared_listener(&self, listener: Arc<dyn HotkeyListener>) -> ListenerId {
        self.shared.listeners.add_shared(listener)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Register a channel listener and return its receiving end
    ///
    /// Events are dropped when the channel already holds `capacity` events.
    /// A capacity of zero is raised to one.
    pub fn subscribe(&self, capacity: usize) -> (ListenerId, mpsc::Receiver<HotkeyEvent>) {
        let (listener, rx) = ChannelListener::channel(capacity);
        (self.add_listener(listener), rx)
    }

    /// Register `hotkey` with the backend
    ///
    /// A loop that was stopped but has not exited yet is joined first, so its
    /// exit reset cannot clear the new registration. Called from a listener
    /// after `stop()`, that join is impossible and the reset still applies.
    pub fn set_hotkey(&self, hotkey: Hotkey) -> Result<()> {
        self.finish_stopped_worker();
        if !self.shared.backend.set_hotkey(&hotkey) {
            warn!(%hotkey, "hotkey rejected by backend");
            return Err(HookError::HotkeyRejected(hotkey.to_string()));
        }
        *self.shared.hotkey.lock() = Some(hotkey);
        info!(%hotkey, "hotkey registered");
        Ok(())
    }

    /// Remove the registered hotkey from the backend
    pub fn reset_hotkey(&self) {
        self.shared.backend.reset_hotkey();
        if let Some(hotkey) = self.shared.hotkey.lock().take() {
            info!(%hotkey, "hotkey reset");
        }
    }

    /// Hotkey most recently registered through this hook
    pub fn hotkey(&self) -> Option<Hotkey> {
        *self.shared.hotkey.lock()
    }

    /// Start the poll thread
    ///
    /// If a previous thread was stopped but has not exited yet, it is joined
    /// first so that two loops never poll the backend at once.
    pub fn start(&self) -> Result<()> {
        self.finish_stopped_worker();

        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(Worker::is_active) {
            return Err(HookError::AlreadyRunning);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::clone(&self.shared);
        let stop_flag = Arc::clone(&stop);
        let interval = self.poll_interval;
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = thread::Builder::new()
            .name("hotkey-poll".to_string())
            .spawn(move || {
                info!(interval_ms = interval.as_millis() as u64, "hotkey poll thread started");
                run_poll_loop(&shared, &stop_flag, interval, generation);
                info!("hotkey poll thread stopped");
            })
            .map_err(|e| HookError::ThreadSpawn(e.to_string()))?;

        *worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Take a stopped worker and wait for it to exit; an active one is left alone
    ///
    /// Joined without the lock so listeners on the old thread can still query
    /// the hook.
    fn finish_stopped_worker(&self) {
        let previous = {
            let mut worker = self.worker.lock();
            if worker.as_ref().is_some_and(Worker::is_active) {
                return;
            }
            worker.take()
        };
        if let Some(previous) = previous {
            previous.finish();
        }
    }

    /// Ask the poll thread to stop and return without waiting
    ///
    /// The thread resets the hotkey on its way out. Use `stop_and_join` when
    /// the reset must have happened before the call returns.
    pub fn stop(&self) {
        if let Some(worker) = self.worker.lock().as_ref() {
            worker.request_stop();
            debug!("hotkey poll thread stop requested");
        }
    }

    /// Stop the poll thread and wait until it has reset the hotkey and exited
    pub fn stop_and_join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.finish();
        }
    }

    /// Check if a poll thread is running and has not been asked to stop
    pub fn is_running(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(Worker::is_active)
    }
}

impl Drop for GlobalKeyboardHook {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for GlobalKeyboardHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalKeyboardHook")
            .field("hotkey", &self.hotkey())
            .field("poll_interval", &self.poll_interval)
            .field("listeners", &self.listener_count())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Body of the poll thread
fn run_poll_loop(shared: &Shared, stop: &AtomicBool, interval: Duration, generation: u64) {
    let started = Instant::now();

    loop {
        if shared.backend.check_hotkey() {
            let event = HotkeyEvent {
                sequence: shared.sequence.fetch_add(1, Ordering::SeqCst) + 1,
                hotkey: *shared.hotkey.lock(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            let delivered = shared.listeners.notify(&event);
            debug!(%event, delivered, "hotkey pressed");
        }

        wait_interval(stop, interval);

        if stop.load(Ordering::SeqCst) {
            // A listener may have restarted the hook from this thread.
            if shared.generation.load(Ordering::SeqCst) == generation {
                shared.backend.reset_hotkey();
                shared.hotkey.lock().take();
            } else {
                debug!(generation, "superseded poll loop exiting without reset");
            }
            break;
        }
    }
}

/// Sleep for `interval`, waking early only when a stop is requested
fn wait_interval(stop: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::DryRunBackend;
    use std::sync::atomic::AtomicUsize;

    const FAST: Duration = Duration::from_millis(5);

    fn hook() -> (Arc<DryRunBackend>, GlobalKeyboardHook) {
        let backend = Arc::new(DryRunBackend::new());
        let hook = GlobalKeyboardHook::with_backend(backend.clone()).with_poll_interval(FAST);
        (backend, hook)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_default_poll_interval() {
        let hook = GlobalKeyboardHook::new(DryRunBackend::new());
        assert_eq!(hook.poll_interval(), Duration::from_millis(100));
        assert!(!hook.is_running());
    }

    #[test]
    fn test_press_notifies_listeners() {
        let (backend, hook) = hook();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        hook.add_listener(move |_: &HotkeyEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        hook.start().unwrap();
        backend.trigger();
        backend.trigger();
        assert!(wait_for(|| count.load(Ordering::SeqCst) == 2));
        hook.stop_and_join();
    }

    #[test]
    fn test_events_carry_sequence_and_hotkey() {
        let (backend, hook) = hook();
        let hotkey: Hotkey = "Ctrl+Shift+F9".parse().unwrap();
        hook.set_hotkey(hotkey).unwrap();
        let (_, mut rx) = hook.subscribe(8);

        hook.start().unwrap();
        backend.trigger();
        backend.trigger();

        let first = tokio_test::block_on(rx.recv()).unwrap();
        let second = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.hotkey, Some(hotkey));
        hook.stop_and_join();
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (_, hook) = hook();
        hook.start().unwrap();
        assert!(hook.is_running());
        assert!(matches!(hook.start(), Err(HookError::AlreadyRunning)));
        hook.stop_and_join();
        assert!(!hook.is_running());
    }

    #[test]
    fn test_stop_resets_hotkey() {
        let (backend, hook) = hook();
        hook.set_hotkey("Alt+F1".parse().unwrap()).unwrap();
        hook.start().unwrap();

        hook.stop();
        assert!(!hook.is_running());
        assert!(wait_for(|| backend.reset_count() == 1));
        assert_eq!(backend.hotkey(), None);
        hook.stop_and_join();
        assert_eq!(hook.hotkey(), None);
    }

    #[test]
    fn test_restart_after_stop() {
        let (backend, hook) = hook();
        let (_, mut rx) = hook.subscribe(8);

        hook.start().unwrap();
        hook.stop();
        hook.start().unwrap();
        assert_eq!(backend.reset_count(), 1);

        backend.trigger();
        let event = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(event.sequence, 1);
        hook.stop_and_join();
        assert_eq!(backend.reset_count(), 2);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let (backend, hook) = hook();
        hook.stop();
        hook.stop_and_join();
        assert_eq!(backend.reset_count(), 0);
    }

    #[test]
    fn test_rejected_hotkey_is_not_remembered() {
        let (backend, hook) = hook();
        backend.set_rejecting(true);
        let err = hook.set_hotkey("Win+L".parse().unwrap()).unwrap_err();
        assert!(matches!(err, HookError::HotkeyRejected(ref s) if s == "Win+L"));
        assert_eq!(hook.hotkey(), None);
    }

    #[test]
    fn test_listener_can_stop_the_hook() {
        let (backend, hook) = hook();
        let hook = Arc::new(hook);
        let weak = Arc::downgrade(&hook);
        hook.add_listener(move |_: &HotkeyEvent| {
            if let Some(hook) = weak.upgrade() {
                hook.stop();
            }
        });

        hook.start().unwrap();
        backend.trigger();
        assert!(wait_for(|| backend.reset_count() == 1));
        assert!(!hook.is_running());
    }

    #[test]
    fn test_listener_restart_keeps_registration() {
        let (backend, hook) = hook();
        let hotkey: Hotkey = "Ctrl+F5".parse().unwrap();
        hook.set_hotkey(hotkey).unwrap();
        let hook = Arc::new(hook);
        let weak = Arc::downgrade(&hook);
        let restarted = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&restarted);
        hook.add_listener(move |_: &HotkeyEvent| {
            if let Some(hook) = weak.upgrade() {
                hook.stop();
                hook.start().unwrap();
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        hook.start().unwrap();
        backend.trigger();
        assert!(wait_for(|| restarted.load(Ordering::SeqCst) == 1));
        // Give the replaced loop time to exit.
        thread::sleep(FAST * 10);

        assert!(hook.is_running());
        assert_eq!(backend.reset_count(), 0);
        assert_eq!(backend.hotkey(), Some(hotkey));
        assert_eq!(hook.hotkey(), Some(hotkey));

        drop(hook);
        assert_eq!(backend.reset_count(), 1);
    }

    #[test]
    fn test_set_hotkey_after_stop_survives_exit() {
        let (backend, hook) = hook();
        hook.set_hotkey("Alt+F1".parse().unwrap()).unwrap();
        hook.start().unwrap();
        hook.stop();

        let hotkey: Hotkey = "Alt+F2".parse().unwrap();
        hook.set_hotkey(hotkey).unwrap();
        assert_eq!(backend.reset_count(), 1);
        thread::sleep(FAST * 4);

        assert_eq!(backend.reset_count(), 1);
        assert_eq!(backend.hotkey(), Some(hotkey));
        assert_eq!(hook.hotkey(), Some(hotkey));
    }

    #[test]
    fn test_set_hotkey_while_running() {
        let (backend, hook) = hook();
        hook.start().unwrap();
        let hotkey: Hotkey = "Shift+F3".parse().unwrap();
        hook.set_hotkey(hotkey).unwrap();
        assert!(hook.is_running());
        assert_eq!(backend.hotkey(), Some(hotkey));
        hook.stop_and_join();
    }

    #[test]
    fn test_subscribe_with_zero_capacity() {
        let (backend, hook) = hook();
        let (_, mut rx) = hook.subscribe(0);

        hook.start().unwrap();
        backend.trigger();
        let event = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(event.sequence, 1);
        hook.stop_and_join();
    }

    #[test]
    fn test_drop_stops_and_resets() {
        let (backend, hook) = hook();
        hook.start().unwrap();
        drop(hook);
        assert_eq!(backend.reset_count(), 1);
    }
}
