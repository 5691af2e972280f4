//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::PresenceRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Presence registry for all session logic.
    pub registry: Arc<PresenceRegistry>,
    /// Outbound event name used for error reports.
    pub error_event_name: Arc<str>,
}
