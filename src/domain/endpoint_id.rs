//! Opaque connection identifier.
//!
//! [`EndpointId`] is assigned by the transport layer when a connection is
//! accepted. A client's session is keyed by its endpoint id, and an
//! inspector references that session by the same value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a live transport connection.
///
/// Generated once per connection (UUID v4 text) and never reused. Inbound
/// payloads may carry arbitrary strings in this position, so the wrapper
/// does not validate the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// Generates a fresh random identifier for a newly accepted connection.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EndpointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<EndpointId> for String {
    fn from(id: EndpointId) -> Self {
        id.0
    }
}
