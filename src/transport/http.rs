//! HTTP transport implementation
//!
//! Half-duplex over two channels: inbound events arrive on a server-push
//! event stream opened against `<server>/message-events`, while outbound
//! messages are posted to `<server>/message` as fire-and-forget calls.
//! Connection status is derived from the event channel alone; the outbound
//! path never influences it.

use async_trait::async_trait;
use log::{debug, error, info};
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use url::form_urlencoded;

use crate::channel::{observer, ObservedChannel};
use crate::error::{Error, Result};
use crate::status::{classify_ready_state, ConnectionStatus};
use crate::types::{
    ClientSyncMessage, CloseCallback, CloseEvent, CloseReason, ConnectParams, ErrorCallback,
    MessageCallback, OpenCallback, StatusCallback,
};

use super::SyncTransport;

/// HTTP transport for the sync protocol
pub struct HttpTransport {
    /// Shared client for the event stream and outbound calls
    http: HttpClient,
    /// Mutable connection state; the lock is never held across an await or
    /// a user callback
    state: Mutex<TransportState>,
}

#[derive(Default)]
struct TransportState {
    channel: Option<ObservedChannel>,
    params: Option<ConnectParams>,
    close_callback: Option<CloseCallback>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| Error::TransportError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(http))
    }

    /// Create a transport that reuses an existing HTTP client
    pub fn with_client(http: HttpClient) -> Self {
        Self {
            http,
            state: Mutex::new(TransportState::default()),
        }
    }
}

fn channel_status(state: &TransportState) -> ConnectionStatus {
    state
        .channel
        .as_ref()
        .map(|channel| classify_ready_state(channel.ready_state()))
        .unwrap_or(ConnectionStatus::Closed)
}

/// Build the event-stream target: server base plus the connection query
fn message_events_url(params: &ConnectParams) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(schema) = &params.schema {
        query.append_pair("schema", schema);
    }
    query.append_pair("sync-schema", &params.sync_schema.to_string());
    query.append_pair("token", &params.token);
    format!(
        "{}/message-events?{}",
        params.server.trim_end_matches('/'),
        query.finish()
    )
}

/// Build the outbound message target
fn message_url(server: &str) -> String {
    format!("{}/message", server.trim_end_matches('/'))
}

#[async_trait]
impl SyncTransport for HttpTransport {
    fn is_open(&self) -> bool {
        channel_status(&self.state.lock()) == ConnectionStatus::Open
    }

    fn connection_status(&self) -> ConnectionStatus {
        channel_status(&self.state.lock())
    }

    async fn connect(&self, params: ConnectParams) {
        if self.state.lock().channel.is_some() {
            self.close(None).await;
        }

        info!("opening event channel to {}", params.server);
        let channel = observer::open(self.http.clone(), message_events_url(&params));

        let mut state = self.state.lock();
        state.channel = Some(channel);
        state.params = Some(params);
    }

    async fn close(&self, reason: Option<CloseReason>) {
        let (channel, close_callback) = {
            let mut state = self.state.lock();
            let Some(channel) = state.channel.take() else {
                debug!("close ignored: no active channel");
                return;
            };
            state.params = None;
            (channel, state.close_callback.take())
        };

        channel.close();
        channel.dispatch_close();
        info!("event channel closed");

        if let Some(callback) = close_callback {
            callback(CloseEvent {
                reason: reason.map(|reason| reason.to_string()),
            });
        }
    }

    async fn send_message(&self, message: ClientSyncMessage) -> bool {
        let (token, server) = {
            let state = self.state.lock();
            let Some(params) = state.params.as_ref() else {
                debug!("send refused: no connection parameters");
                return false;
            };
            if channel_status(&state) != ConnectionStatus::Open {
                debug!("send refused: channel not open");
                return false;
            }
            (params.token.clone(), params.server.clone())
        };

        let body = serde_json::json!({ "message": message, "options": {} });
        let request = self
            .http
            .post(message_url(&server))
            .bearer_auth(token)
            .json(&body);
        tokio::spawn(async move {
            // Delivery is at most once: a failed call is logged and
            // swallowed, never retried.
            if let Err(err) = request.send().await {
                error!("outbound message delivery failed: {}", err);
            }
        });
        true
    }

    fn on_open(&self, callback: OpenCallback) {
        match self.state.lock().channel.as_ref() {
            Some(channel) => channel.set_on_open(callback),
            None => debug!("on_open registration dropped: no active channel"),
        }
    }

    fn on_message(&self, callback: MessageCallback) {
        match self.state.lock().channel.as_ref() {
            Some(channel) => channel.set_on_message(callback),
            None => debug!("on_message registration dropped: no active channel"),
        }
    }

    fn on_error(&self, callback: ErrorCallback) {
        match self.state.lock().channel.as_ref() {
            Some(channel) => channel.set_on_error(callback),
            None => debug!("on_error registration dropped: no active channel"),
        }
    }

    fn on_connection_change(&self, callback: StatusCallback) {
        match self.state.lock().channel.as_ref() {
            Some(channel) => channel.set_on_connection_change(callback),
            None => debug!("on_connection_change registration dropped: no active channel"),
        }
    }

    fn on_close(&self, callback: CloseCallback) {
        self.state.lock().close_callback = Some(callback);
    }
}
