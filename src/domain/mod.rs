//! Domain layer: endpoint identity, sessions, and the event relay.
//!
//! This module contains the presence model: the opaque connection id,
//! the session record with its explicit link state, the inbound payloads,
//! the events relayed to endpoints, and the relay that routes them to live
//! connections.

pub mod endpoint_id;
pub mod payload;
pub mod relay;
pub mod relay_event;
pub mod session;

pub use endpoint_id::EndpointId;
pub use payload::{AuthUpdate, InitPayload, InitRequest, UpdateAuthPayload};
pub use relay::{Delivery, Relay, RelayReceiver};
pub use relay_event::{ErrorKind, RelayEvent};
pub use session::{HistoryRecord, LinkState, Session};
