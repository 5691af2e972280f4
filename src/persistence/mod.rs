//! Persistence layer: the session store and the history log.
//!
//! The registry talks to storage only through the [`SessionStore`] and
//! [`HistoryLog`] traits, injected at construction. Two backends exist:
//! [`memory::MemoryStore`] for tests and single-process deployments, and
//! [`postgres::PostgresStore`] backed by `sqlx::PgPool`.
//!
//! Backends must apply [`SessionStore::find_one_and_update`] and
//! [`SessionStore::delete_many`] atomically per session: an update never
//! observes a half-deleted row and a delete never drops a concurrent
//! update's result on the floor.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod query;

use async_trait::async_trait;

pub use memory::{MemoryHistory, MemoryStore};
pub use postgres::PostgresStore;
pub use query::{SessionFilter, SessionPatch};

use crate::domain::{HistoryRecord, Session};
use crate::error::StoreError;

/// Keyed storage of active sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if a session with the same id is
    /// already active, or a backend error.
    async fn create(&self, session: Session) -> Result<Session, StoreError>;

    /// Applies `patch` to one session matching `filter` and returns the
    /// updated record, or `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns a backend error on storage failure.
    async fn find_one_and_update(
        &self,
        filter: &SessionFilter,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, StoreError>;

    /// Removes every session matching `filter` and returns them.
    ///
    /// # Errors
    ///
    /// Returns a backend error on storage failure.
    async fn delete_many(&self, filter: &SessionFilter) -> Result<Vec<Session>, StoreError>;

    /// Returns all active sessions ordered by connection time.
    ///
    /// # Errors
    ///
    /// Returns a backend error on storage failure.
    async fn list(&self) -> Result<Vec<Session>, StoreError>;
}

/// Append-only log of closed sessions.
#[async_trait]
pub trait HistoryLog: Send + Sync + std::fmt::Debug {
    /// Appends a closed-session record.
    ///
    /// # Errors
    ///
    /// Returns a backend error on storage failure.
    async fn append(&self, record: &HistoryRecord) -> Result<(), StoreError>;
}
