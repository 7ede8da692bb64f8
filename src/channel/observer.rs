//! Status-change synthesis for event channels
//!
//! The raw channel has no "status changed" event in its native vocabulary.
//! This module wraps channel construction so those transitions become
//! observable: [`open`] takes the same arguments as [`EventChannel::open`]
//! and returns an augmented handle carrying a connection-change
//! subscription slot alongside the usual handler slots.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use reqwest::Client as HttpClient;

use crate::status::{classify_ready_state, ConnectionStatus};
use crate::types::{ErrorCallback, MessageCallback, OpenCallback, StatusCallback};

use super::EventChannel;

type SharedStatusCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Recomputes the classified status on demand and pushes it to the
/// registered subscriber, suppressing consecutive duplicates.
struct StatusNotifier {
    ready_state: Arc<AtomicU8>,
    slot: Arc<Mutex<Option<SharedStatusCallback>>>,
    last: Mutex<Option<ConnectionStatus>>,
}

impl StatusNotifier {
    fn notify(&self) {
        let status = classify_ready_state(self.ready_state.load(Ordering::SeqCst));
        {
            let mut last = self.last.lock();
            if *last == Some(status) {
                return;
            }
            *last = Some(status);
        }
        let callback = self.slot.lock().clone();
        match callback {
            Some(callback) => callback(status),
            None => debug!("connection change to {} dropped: no subscriber", status),
        }
    }
}

/// An event channel augmented with synthesized connection-status events
pub struct ObservedChannel {
    channel: EventChannel,
    connection_change: Arc<Mutex<Option<SharedStatusCallback>>>,
}

/// Open an observed channel against `url`.
///
/// On top of the native events, the returned handle delivers one status
/// notification per transition: a connecting tick deferred to the next turn
/// of the event loop (so it lands after this call returns and the caller
/// has had a chance to subscribe), then a freshly classified status on
/// every native open and close. Notifications with no subscriber are
/// dropped, not queued.
pub fn open(client: HttpClient, url: impl Into<String>) -> ObservedChannel {
    let channel = EventChannel::open(client, url);
    let connection_change: Arc<Mutex<Option<SharedStatusCallback>>> = Arc::new(Mutex::new(None));

    let notifier = Arc::new(StatusNotifier {
        ready_state: channel.ready_state_handle(),
        slot: Arc::clone(&connection_change),
        last: Mutex::new(None),
    });

    let tick = Arc::clone(&notifier);
    tokio::spawn(async move { tick.notify() });

    let on_open = Arc::clone(&notifier);
    channel.add_open_listener(move || on_open.notify());
    let on_close = notifier;
    channel.add_close_listener(move || on_close.notify());

    ObservedChannel {
        channel,
        connection_change,
    }
}

impl ObservedChannel {
    /// Replace the connection-change subscriber slot
    pub fn set_on_connection_change(&self, callback: StatusCallback) {
        *self.connection_change.lock() = Some(Arc::from(callback));
    }

    /// Current raw readiness value
    pub fn ready_state(&self) -> u8 {
        self.channel.ready_state()
    }

    /// Replace the open handler slot
    pub fn set_on_open(&self, callback: OpenCallback) {
        self.channel.set_on_open(callback);
    }

    /// Replace the message handler slot
    pub fn set_on_message(&self, callback: MessageCallback) {
        self.channel.set_on_message(callback);
    }

    /// Replace the error handler slot
    pub fn set_on_error(&self, callback: ErrorCallback) {
        self.channel.set_on_error(callback);
    }

    /// Close the underlying channel without firing its close listeners
    pub fn close(&self) {
        self.channel.close();
    }

    /// Fire the channel's close listeners and detach them
    pub fn dispatch_close(&self) {
        self.channel.dispatch_close();
    }
}
