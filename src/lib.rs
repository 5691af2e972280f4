//! # presence-relay
//!
//! WebSocket presence registry and auth relay.
//!
//! Clients connect over `/ws` and announce themselves with `init`. Each
//! ordinary client gets a session keyed by its connection id. An
//! inspector window attaches itself to an existing session by sending
//! `init` with that session's id, after which `update_auth` events for
//! the session are stored and relayed live. A session is removed as soon
//! as either its owner or its inspector disconnects.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Connection Driver (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── PresenceRegistry (service/)
//!     ├── Relay (domain/)
//!     │
//!     └── SessionStore + HistoryLog (persistence/)
//!             ├── MemoryStore
//!             └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
