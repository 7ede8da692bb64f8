//! Error types for the sync transport

use thiserror::Error;

/// Errors surfaced by the transport and its event channel
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Transport error
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

/// Result type using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::TransportError(err.to_string())
    }
}
