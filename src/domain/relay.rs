//! Targeted event delivery to live connections.
//!
//! [`Relay`] wraps a [`tokio::sync::broadcast`] channel of addressed
//! [`Delivery`] values. Every connection holds a [`RelayReceiver`] that
//! filters the stream down to deliveries addressed to its own id.
//!
//! Delivery is fire-and-forget. If no live connection presents the target
//! id the event is dropped: nothing is queued for endpoints that connect
//! later, and the sender is never told.

use tokio::sync::broadcast;

use super::{EndpointId, RelayEvent};

/// An event addressed to one endpoint.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Endpoint that should receive the event.
    pub target: EndpointId,
    /// The event itself.
    pub event: RelayEvent,
}

/// Broadcast-backed router for [`RelayEvent`]s.
///
/// When the ring buffer is full the oldest deliveries are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct Relay {
    sender: broadcast::Sender<Delivery>,
}

impl Relay {
    /// Creates a new `Relay` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `event` to whichever connection currently presents `target`.
    ///
    /// Returns the number of live connections the delivery was offered to
    /// (not the number that matched). Zero means it was dropped.
    pub fn send(&self, target: &EndpointId, event: RelayEvent) -> usize {
        tracing::debug!(%target, event = event.label(), "relay send");
        self.sender
            .send(Delivery {
                target: target.clone(),
                event,
            })
            .unwrap_or(0)
    }

    /// Registers a connection presenting `endpoint`.
    ///
    /// The receiver only sees deliveries sent after this call.
    #[must_use]
    pub fn subscribe(&self, endpoint: EndpointId) -> RelayReceiver {
        RelayReceiver {
            endpoint,
            inner: self.sender.subscribe(),
        }
    }

    /// Returns the number of registered connections.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Per-connection view of the relay.
#[derive(Debug)]
pub struct RelayReceiver {
    endpoint: EndpointId,
    inner: broadcast::Receiver<Delivery>,
}

impl RelayReceiver {
    /// Returns the endpoint this receiver filters for.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// Waits for the next event addressed to this endpoint.
    ///
    /// Returns `None` once the relay is gone.
    pub async fn recv(&mut self) -> Option<RelayEvent> {
        loop {
            match self.inner.recv().await {
                Ok(delivery) if delivery.target == self.endpoint => return Some(delivery.event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(endpoint = %self.endpoint, lagged = n, "connection lagged behind relay");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
