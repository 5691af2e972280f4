//! Events the registry relays to connected endpoints.
//!
//! Every outbound notification is a [`RelayEvent`] addressed to one
//! endpoint through the [`super::Relay`]. The transport layer turns it into
//! a named wire frame.

use serde::Serialize;

use super::EndpointId;

/// Category of a reported failure, as seen by the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required payload field was missing or the frame was malformed.
    Validation,
    /// The inspected session could not be linked.
    DbConnection,
    /// A session store write failed.
    Db,
}

/// Notification delivered to a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Handshake telling a fresh connection its own id.
    Connected {
        /// The connection's assigned id.
        id: EndpointId,
    },

    /// An inspector window attached to the recipient's session.
    Opened {
        /// Connection id of the inspector.
        ida_window_id: EndpointId,
    },

    /// The auth payload for the recipient's session changed.
    AuthChange(serde_json::Value),

    /// A request sent by the recipient failed.
    Error {
        /// Human-readable failure description.
        msg: String,
        /// Failure category.
        kind: ErrorKind,
    },
}

impl RelayEvent {
    /// Returns the wire name for this event. Error events use the
    /// configured `error_event` name.
    #[must_use]
    pub fn name<'a>(&self, error_event: &'a str) -> &'a str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Opened { .. } => "opened",
            Self::AuthChange(_) => "auth_change",
            Self::Error { .. } => error_event,
        }
    }

    /// Returns a fixed label for logging, independent of the configured
    /// error event name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Opened { .. } => "opened",
            Self::AuthChange(_) => "auth_change",
            Self::Error { .. } => "error",
        }
    }

    /// Returns the JSON payload sent with this event.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Connected { id } => serde_json::json!({ "id": id }),
            Self::Opened { ida_window_id } => serde_json::json!({ "ida_window_id": ida_window_id }),
            Self::AuthChange(user) => user.clone(),
            Self::Error { msg, kind } => serde_json::json!({ "msg": msg, "type": kind }),
        }
    }

    /// Convenience constructor for a validation failure.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Error {
            msg: msg.into(),
            kind: ErrorKind::Validation,
        }
    }
}
