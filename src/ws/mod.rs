//! WebSocket layer: connection lifecycle and frame codec.
//!
//! The WebSocket endpoint at `/ws` is the transport for the presence
//! protocol: `init` and `update_auth` in, relayed events out.

pub mod connection;
pub mod handler;
pub mod messages;
