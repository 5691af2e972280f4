//! WebSocket frame envelope and inbound event decoding.
//!
//! Every frame, in both directions, is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::domain::{InitPayload, RelayEvent, UpdateAuthPayload};
use crate::error::PresenceError;

/// Top-level WebSocket frame envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsFrame {
    /// Event name.
    pub event: String,
    /// Event-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WsFrame {
    /// Builds the outbound frame for a relayed event.
    #[must_use]
    pub fn from_relay(event: &RelayEvent, error_event: &str) -> Self {
        Self {
            event: event.name(error_event).to_string(),
            data: event.payload(),
        }
    }

    /// Serializes the frame to JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A decoded client → server event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// `init`
    Init(InitPayload),
    /// `update_auth`
    UpdateAuth(UpdateAuthPayload),
}

impl InboundEvent {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] for malformed JSON, an
    /// unknown event name, or a payload of the wrong shape.
    pub fn parse(text: &str) -> Result<Self, PresenceError> {
        let frame: WsFrame = serde_json::from_str(text)
            .map_err(|e| PresenceError::Validation(format!("malformed frame: {e}")))?;

        match frame.event.as_str() {
            "init" => decode(frame.data).map(Self::Init),
            "update_auth" => decode(frame.data).map(Self::UpdateAuth),
            other => Err(PresenceError::Validation(format!("unknown event [{other}]"))),
        }
    }

    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::UpdateAuth(_) => "update_auth",
        }
    }
}

/// Decodes a payload object; a missing or `null` payload decodes as all
/// fields absent.
fn decode<T>(data: serde_json::Value) -> Result<T, PresenceError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data)
        .map_err(|e| PresenceError::Validation(format!("invalid payload: {e}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EndpointId, ErrorKind};

    #[test]
    fn parses_init() {
        let Ok(InboundEvent::Init(payload)) =
            InboundEvent::parse(r#"{"event":"init","data":{"client_type":"ida","client_id":"a"}}"#)
        else {
            panic!("expected init");
        };
        assert_eq!(payload.client_type.as_deref(), Some("ida"));
        assert_eq!(payload.client_id.as_deref(), Some("a"));
    }

    #[test]
    fn parses_update_auth() {
        let Ok(event) = InboundEvent::parse(
            r#"{"event":"update_auth","data":{"client_id":"a","user":{"name":"x"}}}"#,
        ) else {
            panic!("expected update_auth");
        };
        assert_eq!(event.name(), "update_auth");
    }

    #[test]
    fn missing_data_decodes_as_empty_payload() {
        let Ok(InboundEvent::Init(payload)) = InboundEvent::parse(r#"{"event":"init"}"#) else {
            panic!("expected init");
        };
        assert!(payload.client_type.is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            InboundEvent::parse("not json"),
            Err(PresenceError::Validation(_))
        ));
        assert!(matches!(
            InboundEvent::parse(r#"{"event":"subscribe","data":{}}"#),
            Err(PresenceError::Validation(_))
        ));
        assert!(matches!(
            InboundEvent::parse(r#"{"event":"init","data":{"client_type":5}}"#),
            Err(PresenceError::Validation(_))
        ));
    }

    #[test]
    fn outbound_frames() {
        let frame = WsFrame::from_relay(
            &RelayEvent::Opened {
                ida_window_id: EndpointId::from("w"),
            },
            "error-listenner",
        );
        assert_eq!(
            frame.to_json(),
            r#"{"event":"opened","data":{"ida_window_id":"w"}}"#
        );

        let frame = WsFrame::from_relay(
            &RelayEvent::Error {
                msg: "bad".to_string(),
                kind: ErrorKind::Validation,
            },
            "error-listenner",
        );
        assert_eq!(frame.event, "error-listenner");
        assert_eq!(frame.data.get("type"), Some(&serde_json::json!("validation")));
    }
}
