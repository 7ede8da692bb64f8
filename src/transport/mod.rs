//! Transport layer for the sync protocol
//!
//! This module provides the pluggable seam between a sync client and its
//! server: a trait describing the connection lifecycle, status surface and
//! callback contract, plus the default HTTP implementation.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::status::ConnectionStatus;
use crate::types::{
    ClientSyncMessage, CloseCallback, CloseReason, ConnectParams, ErrorCallback, MessageCallback,
    OpenCallback, StatusCallback,
};

/// Transport interface for exchanging sync messages with a server.
///
/// A transport owns at most one push channel at a time and surfaces its
/// lifecycle through single-slot callbacks: each registration replaces the
/// previous one, so an instance serves exactly one consumer. Event
/// callbacks attach to the current channel and must be registered after
/// [`SyncTransport::connect`]; registrations made while no channel exists
/// are dropped. The close callback lives on the transport itself and may
/// be registered at any time.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Whether a channel exists and is currently open
    fn is_open(&self) -> bool;

    /// Classified status of the current channel, `Closed` when none exists
    fn connection_status(&self) -> ConnectionStatus;

    /// Open a channel to the server, closing any existing one first
    async fn connect(&self, params: ConnectParams);

    /// Close the current channel and notify the close callback
    async fn close(&self, reason: Option<CloseReason>);

    /// Send a message without waiting for delivery.
    ///
    /// Returns `false`, attempting nothing, when no connection parameters
    /// are stored or the channel is not open. Otherwise returns `true` as
    /// soon as the outbound call is issued, regardless of its eventual
    /// fate.
    async fn send_message(&self, message: ClientSyncMessage) -> bool;

    /// Register the open callback on the current channel
    fn on_open(&self, callback: OpenCallback);

    /// Register the message callback on the current channel
    fn on_message(&self, callback: MessageCallback);

    /// Register the error callback on the current channel
    fn on_error(&self, callback: ErrorCallback);

    /// Register the status-change callback on the current channel
    fn on_connection_change(&self, callback: StatusCallback);

    /// Register the close callback on the transport itself
    fn on_close(&self, callback: CloseCallback);
}
