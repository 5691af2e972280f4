//! Active session record and its link state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::EndpointId;

/// Whether an inspector window is attached to a session.
///
/// A session starts [`LinkState::Unlinked`]. An inspector `init` moves it to
/// [`LinkState::Linked`]; a later inspector replaces the window id. The
/// closed state has no variant: a closed session no longer exists in the
/// store and survives only as a [`super::HistoryRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// No inspector attached.
    #[default]
    Unlinked,
    /// An inspector is attached through the given connection.
    Linked {
        /// Connection id of the attached inspector window.
        window_id: EndpointId,
    },
}

impl LinkState {
    /// Returns the attached inspector's connection id, if any.
    #[must_use]
    pub fn window_id(&self) -> Option<&EndpointId> {
        match self {
            Self::Unlinked => None,
            Self::Linked { window_id } => Some(window_id),
        }
    }

    /// Returns the state name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unlinked => "unlinked",
            Self::Linked { .. } => "linked",
        }
    }

    /// Builds the state from an optional stored window id.
    #[must_use]
    pub fn from_window(window_id: Option<EndpointId>) -> Self {
        match window_id {
            Some(window_id) => Self::Linked { window_id },
            None => Self::Unlinked,
        }
    }
}

/// One active non-inspector endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Primary key; the owning connection's id.
    pub session_id: EndpointId,

    /// When the owning connection sent its `init` (immutable).
    pub connected_at: DateTime<Utc>,

    /// Caller-supplied client label (e.g. `"browser"`).
    pub client_kind: String,

    /// Inspector link state.
    pub link: LinkState,

    /// Last-known auth payload, opaque to the registry.
    pub data: Option<serde_json::Value>,

    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new unlinked session owned by `session_id`.
    #[must_use]
    pub fn new(session_id: EndpointId, client_kind: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            connected_at: now,
            client_kind,
            link: LinkState::Unlinked,
            data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches an inspector window, replacing any previous one.
    pub fn link(&mut self, window_id: EndpointId) {
        self.link = LinkState::Linked { window_id };
        self.touch();
    }

    /// Detaches the inspector window.
    pub fn unlink(&mut self) {
        self.link = LinkState::Unlinked;
        self.touch();
    }

    /// Replaces the stored auth payload.
    pub fn set_data(&mut self, data: serde_json::Value) {
        self.data = Some(data);
        self.touch();
    }

    /// Returns the attached inspector's connection id, if any.
    #[must_use]
    pub fn linked_window_id(&self) -> Option<&EndpointId> {
        self.link.window_id()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Snapshot of a session taken when it was closed.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    /// Id of the closed session.
    pub session_id: EndpointId,
    /// When the session was opened.
    pub connected_at: DateTime<Utc>,
    /// Client label of the closed session.
    pub client_kind: String,
    /// Inspector attached at close time, if any.
    pub linked_window_id: Option<EndpointId>,
    /// Auth payload at close time.
    pub data: Option<serde_json::Value>,
    /// Connection whose disconnect closed the session.
    pub closed_by: EndpointId,
    /// Close timestamp.
    pub closed_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Snapshots `session` as closed by `closed_by` now.
    #[must_use]
    pub fn closed(session: Session, closed_by: EndpointId) -> Self {
        let linked_window_id = session.linked_window_id().cloned();
        Self {
            session_id: session.session_id,
            connected_at: session.connected_at,
            client_kind: session.client_kind,
            linked_window_id,
            data: session.data,
            closed_by,
            closed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_unlinked() {
        let session = Session::new(EndpointId::from("a"), "browser".to_string());
        assert_eq!(session.link, LinkState::Unlinked);
        assert!(session.linked_window_id().is_none());
        assert!(session.data.is_none());
        assert_eq!(session.created_at, session.connected_at);
    }

    #[test]
    fn link_then_relink_replaces_window() {
        let mut session = Session::new(EndpointId::from("a"), "browser".to_string());
        session.link(EndpointId::from("w1"));
        assert_eq!(session.linked_window_id(), Some(&EndpointId::from("w1")));
        session.link(EndpointId::from("w2"));
        assert_eq!(session.linked_window_id(), Some(&EndpointId::from("w2")));
        assert_eq!(session.link.as_str(), "linked");
    }

    #[test]
    fn unlink_clears_window() {
        let mut session = Session::new(EndpointId::from("a"), "browser".to_string());
        session.link(EndpointId::from("w1"));
        session.unlink();
        assert_eq!(session.link, LinkState::Unlinked);
    }

    #[test]
    fn link_state_from_window() {
        assert_eq!(LinkState::from_window(None), LinkState::Unlinked);
        let linked = LinkState::from_window(Some(EndpointId::from("w")));
        assert_eq!(linked.window_id(), Some(&EndpointId::from("w")));
    }

    #[test]
    fn history_record_keeps_link_and_data() {
        let mut session = Session::new(EndpointId::from("a"), "browser".to_string());
        session.link(EndpointId::from("w"));
        session.set_data(serde_json::json!({"name": "x"}));
        let record = HistoryRecord::closed(session, EndpointId::from("w"));
        assert_eq!(record.session_id, EndpointId::from("a"));
        assert_eq!(record.linked_window_id, Some(EndpointId::from("w")));
        assert_eq!(record.data, Some(serde_json::json!({"name": "x"})));
        assert_eq!(record.closed_by, EndpointId::from("w"));
    }
}
