//! Session DTOs for the read-only listing endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Session;

/// One active session as exposed over REST.
///
/// The auth payload is deliberately not exposed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDto {
    /// Session id (the owning connection id).
    pub session_id: String,
    /// Client label supplied at `init`.
    pub client_kind: String,
    /// `"unlinked"` or `"linked"`.
    pub state: String,
    /// Attached inspector connection id.
    pub linked_window_id: Option<String>,
    /// Whether an auth payload has been stored.
    pub has_data: bool,
    /// When the session was opened.
    pub connected_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionDto {
    fn from(session: Session) -> Self {
        Self {
            state: session.link.as_str().to_string(),
            linked_window_id: session.linked_window_id().map(ToString::to_string),
            has_data: session.data.is_some(),
            session_id: session.session_id.into(),
            client_kind: session.client_kind,
            connected_at: session.connected_at,
            updated_at: session.updated_at,
        }
    }
}

/// Response body for `GET /api/v1/sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Active sessions, oldest first.
    pub data: Vec<SessionDto>,
    /// Number of active sessions.
    pub total: usize,
    /// Number of sessions with an inspector attached.
    pub linked: usize,
}

impl From<Vec<Session>> for SessionListResponse {
    fn from(sessions: Vec<Session>) -> Self {
        let data: Vec<SessionDto> = sessions.into_iter().map(SessionDto::from).collect();
        let linked = data.iter().filter(|s| s.linked_window_id.is_some()).count();
        Self {
            total: data.len(),
            linked,
            data,
        }
    }
}
