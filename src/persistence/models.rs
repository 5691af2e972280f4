//! Database row models for active sessions and session history.

use chrono::{DateTime, Utc};

use crate::domain::{EndpointId, LinkState, Session};

/// Column list selected for every `active_sessions` read.
pub const SESSION_COLUMNS: &str =
    "session_id, connected_at, client_kind, linked_window_id, data, created_at, updated_at";

/// A row from the `active_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    /// Primary key; the owning connection id.
    pub session_id: String,
    /// When the owning connection sent `init`.
    pub connected_at: DateTime<Utc>,
    /// Client label.
    pub client_kind: String,
    /// Attached inspector connection id.
    pub linked_window_id: Option<String>,
    /// JSONB auth payload.
    pub data: Option<serde_json::Value>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: EndpointId::from(row.session_id),
            connected_at: row.connected_at,
            client_kind: row.client_kind,
            link: LinkState::from_window(row.linked_window_id.map(EndpointId::from)),
            data: row.data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn row_with_window_is_linked() {
        let now = Utc::now();
        let row = SessionRow {
            session_id: "a".to_string(),
            connected_at: now,
            client_kind: "browser".to_string(),
            linked_window_id: Some("w".to_string()),
            data: Some(serde_json::json!({"name": "x"})),
            created_at: now,
            updated_at: now,
        };
        let session = Session::from(row);
        assert_eq!(session.session_id, EndpointId::from("a"));
        assert_eq!(session.linked_window_id(), Some(&EndpointId::from("w")));
        assert_eq!(session.data, Some(serde_json::json!({"name": "x"})));
    }

    #[test]
    fn row_without_window_is_unlinked() {
        let now = Utc::now();
        let row = SessionRow {
            session_id: "a".to_string(),
            connected_at: now,
            client_kind: "browser".to_string(),
            linked_window_id: None,
            data: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(Session::from(row).link, LinkState::Unlinked);
    }
}
