//! Session predicates and patches understood by every store backend.

use crate::domain::{EndpointId, Session};

/// Predicate over active sessions.
///
/// Limited to equality on the two id columns and logical OR, which is all
/// the registry needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFilter {
    /// `session_id == id`
    SessionId(EndpointId),
    /// `linked_window_id == id`
    LinkedWindow(EndpointId),
    /// Matches when any inner filter matches. An empty list matches nothing.
    Any(Vec<SessionFilter>),
}

impl SessionFilter {
    /// Matches the session owned by `id` or the session `id` is inspecting.
    #[must_use]
    pub fn owned_or_inspected_by(id: &EndpointId) -> Self {
        Self::Any(vec![
            Self::SessionId(id.clone()),
            Self::LinkedWindow(id.clone()),
        ])
    }

    /// Evaluates the filter against an in-memory session.
    #[must_use]
    pub fn matches(&self, session: &Session) -> bool {
        match self {
            Self::SessionId(id) => session.session_id == *id,
            Self::LinkedWindow(id) => session.linked_window_id() == Some(id),
            Self::Any(filters) => filters.iter().any(|f| f.matches(session)),
        }
    }
}

/// Mutation applied by [`super::SessionStore::find_one_and_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPatch {
    /// Attach an inspector window.
    Link(EndpointId),
    /// Detach the inspector window.
    Unlink,
    /// Replace the stored auth payload.
    SetData(serde_json::Value),
}

impl SessionPatch {
    /// Applies the patch to an in-memory session.
    pub fn apply(&self, session: &mut Session) {
        match self {
            Self::Link(window_id) => session.link(window_id.clone()),
            Self::Unlink => session.unlink(),
            Self::SetData(data) => session.set_data(data.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn linked(owner: &str, window: &str) -> Session {
        let mut session = Session::new(EndpointId::from(owner), "browser".to_string());
        session.link(EndpointId::from(window));
        session
    }

    #[test]
    fn owned_or_inspected_matches_both_sides() {
        let session = linked("a", "w");
        assert!(SessionFilter::owned_or_inspected_by(&EndpointId::from("a")).matches(&session));
        assert!(SessionFilter::owned_or_inspected_by(&EndpointId::from("w")).matches(&session));
        assert!(!SessionFilter::owned_or_inspected_by(&EndpointId::from("z")).matches(&session));
    }

    #[test]
    fn linked_window_does_not_match_unlinked() {
        let session = Session::new(EndpointId::from("a"), "browser".to_string());
        assert!(!SessionFilter::LinkedWindow(EndpointId::from("a")).matches(&session));
    }

    #[test]
    fn empty_any_matches_nothing() {
        assert!(!SessionFilter::Any(Vec::new()).matches(&linked("a", "w")));
    }

    #[test]
    fn patches_apply() {
        let mut session = Session::new(EndpointId::from("a"), "browser".to_string());
        SessionPatch::Link(EndpointId::from("w")).apply(&mut session);
        assert_eq!(session.linked_window_id(), Some(&EndpointId::from("w")));
        SessionPatch::SetData(serde_json::json!({"k": 1})).apply(&mut session);
        assert_eq!(session.data, Some(serde_json::json!({"k": 1})));
        SessionPatch::Unlink.apply(&mut session);
        assert!(session.linked_window_id().is_none());
    }
}
