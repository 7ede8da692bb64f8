//! Shared data types for the transport layer

use crate::error::Error;
use crate::status::ConnectionStatus;

/// Parameters for opening a logical connection.
///
/// Held by the transport only while a channel exists and cleared again on
/// close; `send_message` refuses to run without them.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Bearer token presented on the event channel and on outbound calls
    pub token: String,
    /// Base server URL, e.g. `https://sync.example.com`
    pub server: String,
    /// Optional schema identifier, sent in string form when present
    pub schema: Option<String>,
    /// Whether the server should synchronize schema state for this session
    pub sync_schema: bool,
}

impl ConnectParams {
    /// Create connection parameters with no schema and schema sync disabled
    pub fn new(token: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            server: server.into(),
            schema: None,
            sync_schema: false,
        }
    }

    /// Set the schema identifier
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the schema sync flag
    pub fn with_sync_schema(mut self, sync_schema: bool) -> Self {
        self.sync_schema = sync_schema;
        self
    }
}

/// Outbound message payload; forwarded without inspection
pub type ClientSyncMessage = serde_json::Value;

/// Opaque description of why a close happened; serialized into the close
/// event and never interpreted by the transport
pub type CloseReason = serde_json::Value;

/// A message delivered by the event channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Verbatim payload as surfaced by the channel
    pub data: String,
}

/// Payload handed to the close callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// Serialized close reason, when one was supplied
    pub reason: Option<String>,
}

/// Callback invoked when the channel's open event fires
pub type OpenCallback = Box<dyn Fn() + Send + Sync>;

/// Callback invoked for each message delivered by the channel
pub type MessageCallback = Box<dyn Fn(MessageEvent) + Send + Sync>;

/// Callback invoked when the channel surfaces an error
pub type ErrorCallback = Box<dyn Fn(Error) + Send + Sync>;

/// Callback invoked with each synthesized connection status change
pub type StatusCallback = Box<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Callback invoked when the transport closes its channel
pub type CloseCallback = Box<dyn Fn(CloseEvent) + Send + Sync>;
