//! WebSocket connection lifecycle.
//!
//! Handles the read/write loop for a single WebSocket connection:
//! assigns the connection its endpoint id, dispatches inbound events to
//! the [`PresenceRegistry`] one at a time, forwards relayed events
//! addressed to this endpoint, and runs the disconnect handler once the
//! socket closes.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{InboundEvent, WsFrame};
use crate::app_state::AppState;
use crate::domain::{EndpointId, RelayEvent};
use crate::service::PresenceRegistry;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends a `connected` frame carrying the endpoint id.
/// - Reads events from the client and awaits each handler to completion.
/// - Forwards events from the relay addressed to this endpoint.
/// - On close, awaits [`PresenceRegistry::handle_disconnect`].
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let endpoint = EndpointId::generate();
    let registry = state.registry;
    let error_event = state.error_event_name;

    // Subscribe before anything can be addressed to this endpoint.
    let mut relay_rx = registry.relay().subscribe(endpoint.clone());
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::info!(%endpoint, "ws connection opened");

    let hello = WsFrame::from_relay(
        &RelayEvent::Connected {
            id: endpoint.clone(),
        },
        &error_event,
    );
    if ws_tx.send(Message::text(hello.to_json())).await.is_ok() {
        loop {
            tokio::select! {
                // Incoming message from client
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let reply = handle_text_message(text.as_str(), &registry, &endpoint).await;
                            if let Some(frame) = reply
                                && ws_tx.send(Message::text(WsFrame::from_relay(&frame, &error_event).to_json())).await.is_err() {
                                    break;
                                }
                        }
                        Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                        _ => {}
                    }
                }
                // Event addressed to this endpoint
                event = relay_rx.recv() => {
                    let Some(event) = event else { break };
                    let frame = WsFrame::from_relay(&event, &error_event);
                    tracing::debug!(%endpoint, event = %frame.event, "forwarding relayed event");
                    if ws_tx.send(Message::text(frame.to_json())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(relay_rx);
    let removed = registry.handle_disconnect(&endpoint).await;
    tracing::info!(%endpoint, removed, "ws connection closed");
}

/// Handles a text message from the client.
///
/// Well-formed events go to the registry, which reports its own failures
/// through the relay. A frame that cannot be decoded is answered directly
/// with the returned validation error.
async fn handle_text_message(
    text: &str,
    registry: &PresenceRegistry,
    endpoint: &EndpointId,
) -> Option<RelayEvent> {
    let event = match InboundEvent::parse(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(%endpoint, error = %err, "rejected frame");
            return Some(RelayEvent::Error {
                msg: err.to_string(),
                kind: err.kind(),
            });
        }
    };

    tracing::debug!(%endpoint, event = event.name(), "inbound event");
    match event {
        InboundEvent::Init(payload) => match registry.handle_init(payload, endpoint).await {
            Some(session) => {
                tracing::debug!(%endpoint, session_id = %session.session_id, state = session.link.as_str(), "init applied");
            }
            None => tracing::debug!(%endpoint, "init rejected"),
        },
        InboundEvent::UpdateAuth(payload) => registry.handle_update_auth(payload, endpoint).await,
    }
    None
}
