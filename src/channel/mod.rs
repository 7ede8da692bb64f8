//! Server-push event channel
//!
//! [`EventChannel`] is the raw push primitive: a long-lived
//! `text/event-stream` request owned by a background driver task. Its
//! native vocabulary is open, message, error and close; the synthesized
//! status-change events layered on top live in [`observer`].

pub mod observer;
mod sse;

pub use observer::ObservedChannel;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use log::debug;
use parking_lot::Mutex;
use reqwest::{header, Client as HttpClient};
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::status::ready_state::{CLOSED, CONNECTING, OPEN};
use crate::types::{ErrorCallback, MessageCallback, MessageEvent, OpenCallback};

use self::sse::SseDecoder;

type SharedOpenCallback = Arc<dyn Fn() + Send + Sync>;
type SharedMessageCallback = Arc<dyn Fn(MessageEvent) + Send + Sync>;
type SharedErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;
type EventListener = Arc<dyn Fn() + Send + Sync>;

/// Handler slots and internal listeners attached to a channel.
///
/// Slot locks are never held while a callback runs, so a handler may
/// re-register handlers or close the channel without deadlocking.
#[derive(Default)]
struct ChannelHooks {
    on_open: Mutex<Option<SharedOpenCallback>>,
    on_message: Mutex<Option<SharedMessageCallback>>,
    on_error: Mutex<Option<SharedErrorCallback>>,
    open_listeners: Mutex<Vec<EventListener>>,
    close_listeners: Mutex<Vec<EventListener>>,
}

impl ChannelHooks {
    fn dispatch_open(&self) {
        let callback = self.on_open.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
        let listeners: Vec<EventListener> = self.open_listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }

    fn dispatch_message(&self, event: MessageEvent) {
        let callback = self.on_message.lock().clone();
        match callback {
            Some(callback) => callback(event),
            None => debug!("channel message dropped: no handler registered"),
        }
    }

    fn dispatch_error(&self, error: Error) {
        let callback = self.on_error.lock().clone();
        match callback {
            Some(callback) => callback(error),
            None => debug!("channel error dropped, no handler registered: {}", error),
        }
    }

    fn dispatch_close(&self) {
        // Close also tears the listener registry down, so a channel fires
        // its close listeners at most once.
        let listeners = std::mem::take(&mut *self.close_listeners.lock());
        self.open_listeners.lock().clear();
        for listener in listeners {
            listener();
        }
    }
}

/// The server-push channel primitive.
///
/// A channel starts in the connecting state and progresses as its driver
/// task advances; all progress is reported through the handler slots.
/// Dropping the channel aborts the driver.
pub struct EventChannel {
    ready_state: Arc<AtomicU8>,
    hooks: Arc<ChannelHooks>,
    driver: JoinHandle<()>,
}

impl EventChannel {
    /// Open a channel against `url` using the supplied HTTP client.
    ///
    /// Returns immediately with readiness `CONNECTING`; connection progress
    /// arrives through the channel's events. Must be called from within a
    /// Tokio runtime.
    pub fn open(client: HttpClient, url: impl Into<String>) -> Self {
        let url = url.into();
        let ready_state = Arc::new(AtomicU8::new(CONNECTING));
        let hooks = Arc::new(ChannelHooks::default());
        let driver = tokio::spawn(run_driver(
            client,
            url,
            Arc::clone(&ready_state),
            Arc::clone(&hooks),
        ));
        Self {
            ready_state,
            hooks,
            driver,
        }
    }

    /// Current raw readiness value
    pub fn ready_state(&self) -> u8 {
        self.ready_state.load(Ordering::SeqCst)
    }

    pub(crate) fn ready_state_handle(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.ready_state)
    }

    /// Replace the open handler slot
    pub fn set_on_open(&self, callback: OpenCallback) {
        *self.hooks.on_open.lock() = Some(Arc::from(callback));
    }

    /// Replace the message handler slot
    pub fn set_on_message(&self, callback: MessageCallback) {
        *self.hooks.on_message.lock() = Some(Arc::from(callback));
    }

    /// Replace the error handler slot
    pub fn set_on_error(&self, callback: ErrorCallback) {
        *self.hooks.on_error.lock() = Some(Arc::from(callback));
    }

    /// Register an internal listener for the native open event
    pub(crate) fn add_open_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.hooks.open_listeners.lock().push(Arc::new(listener));
    }

    /// Register an internal listener for the close event
    pub(crate) fn add_close_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.hooks.close_listeners.lock().push(Arc::new(listener));
    }

    /// Close the channel: mark it closed and stop the driver.
    ///
    /// The primitive closes silently. A caller that wants close listeners
    /// to fire follows up with [`EventChannel::dispatch_close`].
    pub fn close(&self) {
        self.ready_state.store(CLOSED, Ordering::SeqCst);
        self.driver.abort();
    }

    /// Fire the close listeners once and detach all internal listeners
    pub fn dispatch_close(&self) {
        self.hooks.dispatch_close();
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn fail_channel(hooks: &ChannelHooks, ready_state: &AtomicU8, error: Error) {
    hooks.dispatch_error(error);
    ready_state.store(CLOSED, Ordering::SeqCst);
    hooks.dispatch_close();
}

/// Drive the event-stream request to completion, translating its progress
/// into channel events.
async fn run_driver(
    client: HttpClient,
    url: String,
    ready_state: Arc<AtomicU8>,
    hooks: Arc<ChannelHooks>,
) {
    let response = match client
        .get(&url)
        .header(header::ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            fail_channel(&hooks, &ready_state, Error::from(err));
            return;
        }
    };

    if !response.status().is_success() {
        fail_channel(
            &hooks,
            &ready_state,
            Error::TransportError(format!(
                "event stream request failed with status {}",
                response.status()
            )),
        );
        return;
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("text/event-stream") {
        fail_channel(
            &hooks,
            &ready_state,
            Error::ProtocolError(format!(
                "expected a text/event-stream response, got {:?}",
                content_type
            )),
        );
        return;
    }

    ready_state.store(OPEN, Ordering::SeqCst);
    hooks.dispatch_open();
    debug!("event channel open");

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for event in decoder.feed(&bytes) {
                    hooks.dispatch_message(event);
                }
            }
            Err(err) => {
                hooks.dispatch_error(Error::from(err));
                break;
            }
        }
    }

    ready_state.store(CLOSED, Ordering::SeqCst);
    hooks.dispatch_close();
    debug!("event channel closed");
}
