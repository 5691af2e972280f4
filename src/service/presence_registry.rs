//! Presence registry: maps connection lifecycle events to store operations.

use std::str::FromStr;
use std::sync::Arc;

use crate::domain::{
    EndpointId, HistoryRecord, InitPayload, InitRequest, Relay, RelayEvent, Session,
    UpdateAuthPayload,
};
use crate::error::PresenceError;
use crate::persistence::{HistoryLog, SessionFilter, SessionPatch, SessionStore};

/// What an inspector window's disconnect does to the session it inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Delete the whole session when either the owner or the inspector
    /// disconnects.
    #[default]
    Delete,
    /// Only clear the link when the inspector disconnects; the owner's
    /// disconnect still deletes the session.
    Unlink,
}

impl FromStr for DisconnectPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "unlink" => Ok(Self::Unlink),
            _ => Err(()),
        }
    }
}

/// Owner of the session link state machine.
///
/// Stateless coordinator: all shared state lives in the injected
/// [`SessionStore`], and every notification goes out through the
/// [`Relay`]. Handler failures are reported to the originating endpoint
/// as error events and never returned to the caller.
///
/// Per session: `Unlinked → Linked` on an inspector `init`,
/// `Linked → Linked` on `update_auth` or a re-link, and either state to
/// closed (row deleted) when the owner or its inspector disconnects.
#[derive(Debug, Clone)]
pub struct PresenceRegistry {
    store: Arc<dyn SessionStore>,
    history: Option<Arc<dyn HistoryLog>>,
    relay: Relay,
    inspector_client_types: Vec<String>,
    disconnect_policy: DisconnectPolicy,
}

impl PresenceRegistry {
    /// Creates a registry with the default inspector labels (`"ida"`,
    /// `"inspector"`), the delete-on-either disconnect policy and no
    /// history log.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, relay: Relay) -> Self {
        Self {
            store,
            history: None,
            relay,
            inspector_client_types: vec!["ida".to_string(), "inspector".to_string()],
            disconnect_policy: DisconnectPolicy::Delete,
        }
    }

    /// Appends every closed session to `history`.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryLog>) -> Self {
        self.history = Some(history);
        self
    }

    /// Replaces the `client_type` values that denote an inspector window.
    #[must_use]
    pub fn with_inspector_client_types(mut self, types: Vec<String>) -> Self {
        self.inspector_client_types = types;
        self
    }

    /// Sets the disconnect policy.
    #[must_use]
    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }

    /// Returns a reference to the inner [`Relay`].
    #[must_use]
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Handles an `init` event from `endpoint`.
    ///
    /// An ordinary client gets a new session keyed by its own id. An
    /// inspector is linked to the session named by `client_id`, and that
    /// session's owner receives `opened`. Returns the created or linked
    /// session, or `None` after reporting the failure to `endpoint`.
    pub async fn handle_init(&self, payload: InitPayload, endpoint: &EndpointId) -> Option<Session> {
        match self.init(payload, endpoint).await {
            Ok(session) => Some(session),
            Err(err) => {
                self.report(endpoint, &err);
                None
            }
        }
    }

    async fn init(
        &self,
        payload: InitPayload,
        endpoint: &EndpointId,
    ) -> Result<Session, PresenceError> {
        match payload.validate(&self.inspector_client_types)? {
            InitRequest::Client { kind } => {
                let session = self
                    .store
                    .create(Session::new(endpoint.clone(), kind))
                    .await?;
                tracing::info!(session_id = %endpoint, client_kind = %session.client_kind, "session created");
                Ok(session)
            }
            InitRequest::Inspector { target } => self.link(target, endpoint).await,
        }
    }

    async fn link(
        &self,
        target: EndpointId,
        window_id: &EndpointId,
    ) -> Result<Session, PresenceError> {
        let session = self
            .store
            .find_one_and_update(
                &SessionFilter::SessionId(target.clone()),
                &SessionPatch::Link(window_id.clone()),
            )
            .await
            .map_err(|source| PresenceError::LinkFailed {
                target: target.clone(),
                source,
            })?
            .ok_or_else(|| PresenceError::SessionNotFound(target.clone()))?;

        self.relay.send(
            &target,
            RelayEvent::Opened {
                ida_window_id: window_id.clone(),
            },
        );
        tracing::info!(session_id = %target, window_id = %window_id, "inspector linked");
        Ok(session)
    }

    /// Handles an `update_auth` event from `endpoint`.
    ///
    /// Stores `user` on the target session, then relays `auth_change` to
    /// the target whether or not the store write succeeded. A store
    /// failure is reported to `endpoint`; a missing session is not.
    pub async fn handle_update_auth(&self, payload: UpdateAuthPayload, endpoint: &EndpointId) {
        let update = match payload.validate() {
            Ok(update) => update,
            Err(err) => {
                self.report(endpoint, &err);
                return;
            }
        };

        match self
            .store
            .find_one_and_update(
                &SessionFilter::SessionId(update.target.clone()),
                &SessionPatch::SetData(update.user.clone()),
            )
            .await
        {
            Ok(Some(_)) => tracing::debug!(session_id = %update.target, "auth data stored"),
            Ok(None) => tracing::debug!(session_id = %update.target, "auth update for inactive session"),
            Err(source) => self.report(endpoint, &PresenceError::Storage(source)),
        }

        self.relay
            .send(&update.target, RelayEvent::AuthChange(update.user));
    }

    /// Handles the disconnect of `endpoint`.
    ///
    /// Under [`DisconnectPolicy::Delete`] every session owned or inspected
    /// by `endpoint` is deleted. Under [`DisconnectPolicy::Unlink`] only
    /// the owned session is deleted and inspected sessions are unlinked.
    /// Returns the number of deleted sessions; zero is not an error.
    pub async fn handle_disconnect(&self, endpoint: &EndpointId) -> usize {
        let filter = match self.disconnect_policy {
            DisconnectPolicy::Delete => SessionFilter::owned_or_inspected_by(endpoint),
            DisconnectPolicy::Unlink => SessionFilter::SessionId(endpoint.clone()),
        };

        let removed = match self.store.delete_many(&filter).await {
            Ok(removed) => removed,
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "failed to delete sessions on disconnect");
                Vec::new()
            }
        };

        if self.disconnect_policy == DisconnectPolicy::Unlink {
            self.unlink_window(endpoint).await;
        }

        let count = removed.len();
        for session in removed {
            tracing::info!(session_id = %session.session_id, closed_by = %endpoint, "session closed");
            self.record_history(HistoryRecord::closed(session, endpoint.clone()))
                .await;
        }
        count
    }

    /// Clears `window_id` from every session it is linked to.
    async fn unlink_window(&self, window_id: &EndpointId) {
        let filter = SessionFilter::LinkedWindow(window_id.clone());
        loop {
            match self
                .store
                .find_one_and_update(&filter, &SessionPatch::Unlink)
                .await
            {
                Ok(Some(session)) => {
                    tracing::info!(session_id = %session.session_id, %window_id, "inspector unlinked");
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(%window_id, error = %err, "failed to unlink inspector");
                    break;
                }
            }
        }
    }

    async fn record_history(&self, record: HistoryRecord) {
        let Some(history) = &self.history else {
            return;
        };
        if let Err(err) = history.append(&record).await {
            tracing::warn!(session_id = %record.session_id, error = %err, "failed to append session history");
        }
    }

    /// Returns all active sessions.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Storage`] on store failure.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, PresenceError> {
        Ok(self.store.list().await?)
    }

    /// Sends an error event describing `err` back to `endpoint`.
    fn report(&self, endpoint: &EndpointId, err: &PresenceError) {
        tracing::warn!(%endpoint, error = %err, "request failed");
        self.relay.send(
            endpoint,
            RelayEvent::Error {
                msg: err.to_string(),
                kind: err.kind(),
            },
        );
    }
}
