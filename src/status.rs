//! Connection status derivation
//!
//! The event channel reports its low-level state as a raw readiness value.
//! Higher layers never see that number directly; they work with the
//! classified [`ConnectionStatus`], recomputed on demand and never cached.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw readiness values reported by an event channel
pub mod ready_state {
    /// The channel is still negotiating its connection
    pub const CONNECTING: u8 = 0;
    /// The channel is established and delivering events
    pub const OPEN: u8 = 1;
    /// The channel is gone; a fresh connect is required
    pub const CLOSED: u8 = 2;
}

/// Logical connection status derived from a channel's readiness value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Connection attempt in progress
    Connecting,
    /// Channel established, messages can flow
    Open,
    /// No usable channel
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Connecting => "CONNECTING",
            ConnectionStatus::Open => "OPEN",
            ConnectionStatus::Closed => "CLOSED",
        };
        write!(f, "{}", label)
    }
}

/// Classify a raw readiness value into a [`ConnectionStatus`].
///
/// Any value outside the known readiness set classifies as `Closed`, so an
/// unrecognized channel state is reported as unusable rather than usable.
pub fn classify_ready_state(raw: u8) -> ConnectionStatus {
    match raw {
        ready_state::CONNECTING => ConnectionStatus::Connecting,
        ready_state::OPEN => ConnectionStatus::Open,
        _ => ConnectionStatus::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_ready_states() {
        assert_eq!(
            classify_ready_state(ready_state::CONNECTING),
            ConnectionStatus::Connecting
        );
        assert_eq!(classify_ready_state(ready_state::OPEN), ConnectionStatus::Open);
        assert_eq!(classify_ready_state(ready_state::CLOSED), ConnectionStatus::Closed);
    }

    #[test]
    fn unknown_ready_states_classify_as_closed() {
        for raw in [3u8, 4, 17, 255] {
            assert_eq!(classify_ready_state(raw), ConnectionStatus::Closed);
        }
    }

    #[test]
    fn displays_wire_vocabulary() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "CONNECTING");
        assert_eq!(ConnectionStatus::Open.to_string(), "OPEN");
        assert_eq!(ConnectionStatus::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn serializes_in_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ConnectionStatus::Open).unwrap(),
            serde_json::json!("OPEN")
        );
        assert_eq!(
            serde_json::from_str::<ConnectionStatus>("\"CONNECTING\"").unwrap(),
            ConnectionStatus::Connecting
        );
    }
}
