//! In-process session store.
//!
//! [`MemoryStore`] keeps active sessions in a `HashMap` behind a single
//! [`tokio::sync::RwLock`]. Every mutating operation holds the write lock
//! for its whole duration, so updates and deletes on the same session
//! never interleave.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{HistoryLog, SessionFilter, SessionPatch, SessionStore};
use crate::domain::{EndpointId, HistoryRecord, Session};
use crate::error::StoreError;

/// Session store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<EndpointId, Session>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the session with the given id.
    pub async fn get(&self, session_id: &EndpointId) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Returns the number of active sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is active.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let mut map = self.sessions.write().await;
        if map.contains_key(&session.session_id) {
            return Err(StoreError::Duplicate(session.session_id));
        }
        map.insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    async fn find_one_and_update(
        &self,
        filter: &SessionFilter,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, StoreError> {
        let mut map = self.sessions.write().await;
        let Some(session) = map.values_mut().find(|s| filter.matches(s)) else {
            return Ok(None);
        };
        patch.apply(session);
        Ok(Some(session.clone()))
    }

    async fn delete_many(&self, filter: &SessionFilter) -> Result<Vec<Session>, StoreError> {
        let mut map = self.sessions.write().await;
        let mut removed = Vec::new();
        map.retain(|_, session| {
            if filter.matches(session) {
                removed.push(session.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        let map = self.sessions.read().await;
        let mut sessions: Vec<Session> = map.values().cloned().collect();
        sessions.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        Ok(sessions)
    }
}

/// History log held in memory, oldest record first.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: RwLock<Vec<HistoryRecord>>,
}

impl MemoryHistory {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every appended record.
    pub async fn records(&self) -> Vec<HistoryRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl HistoryLog for MemoryHistory {
    async fn append(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
