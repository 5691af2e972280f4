//! Service layer: presence orchestration.
//!
//! [`PresenceRegistry`] turns `init`, `update_auth` and disconnect events
//! into session store operations and relays notifications through the
//! [`super::domain::Relay`].

pub mod presence_registry;

pub use presence_registry::{DisconnectPolicy, PresenceRegistry};
