//! # Syncwire: Real-Time Sync Transport
//!
//! `syncwire` is the connection layer for sync clients: it carries messages
//! between a client and its server over a persistent server-push channel
//! while exposing a stable notion of connection status to the layers above.
//!
//! The wire model is half-duplex over two channels. Inbound events arrive
//! on a long-lived `text/event-stream` request; outbound messages travel
//! as fire-and-forget HTTP calls. On top of the raw channel the crate
//! synthesizes the status transitions the primitive never reports itself,
//! so consumers observe a clean `CONNECTING -> OPEN -> CLOSED` lifecycle.
//!
//! ## Features
//!
//! - Pluggable transport seam ([`SyncTransport`]) with an HTTP default
//! - Connection status derived on demand, never cached
//! - Synthesized status-change events, one per transition
//! - Non-blocking sends gated on channel status
//! - No automatic reconnection; retry policy belongs to the caller

pub mod channel;
pub mod error;
pub mod status;
pub mod transport;
pub mod types;

// Re-export commonly used types for convenience
pub use channel::{EventChannel, ObservedChannel};
pub use error::Error;
pub use status::{classify_ready_state, ready_state, ConnectionStatus};
pub use transport::{HttpTransport, SyncTransport};
pub use types::{
    ClientSyncMessage, CloseCallback, CloseEvent, CloseReason, ConnectParams, ErrorCallback,
    MessageCallback, MessageEvent, OpenCallback, StatusCallback,
};
