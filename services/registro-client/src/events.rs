//! Client events broadcast to subscribers

use serde_json::Value;

/// State change or inbound message published by the client
///
/// A presentation layer subscribes to these instead of the client reaching
/// into any UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// WebSocket opened (initially or after a reconnect)
    Connected,
    /// WebSocket closed or failed to open
    Disconnected { reason: String },
    /// A reconnect attempt is about to run
    Reconnecting { attempt: u32, max_attempts: u32 },
    /// Reconnection gave up; the socket stays closed until the next
    /// explicit connect
    ReconnectFailed { reason: String },
    /// JSON payload received over the WebSocket
    Message(Value),
    LoggedIn,
    LoggedOut,
}

impl ClientEvent {
    /// Short label for logs and status displays
    pub fn label(&self) -> &'static str {
        match self {
            ClientEvent::Connected => "connected",
            ClientEvent::Disconnected { .. } => "disconnected",
            ClientEvent::Reconnecting { .. } => "reconnecting",
            ClientEvent::ReconnectFailed { .. } => "reconnect_failed",
            ClientEvent::Message(_) => "message",
            ClientEvent::LoggedIn => "logged_in",
            ClientEvent::LoggedOut => "logged_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let events = [
            ClientEvent::Connected,
            ClientEvent::Disconnected {
                reason: String::new(),
            },
            ClientEvent::Reconnecting {
                attempt: 1,
                max_attempts: 5,
            },
            ClientEvent::ReconnectFailed {
                reason: String::new(),
            },
            ClientEvent::Message(Value::Null),
            ClientEvent::LoggedIn,
            ClientEvent::LoggedOut,
        ];
        let mut labels: Vec<_> = events.iter().map(ClientEvent::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), events.len());
    }
}
