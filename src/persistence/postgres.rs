//! PostgreSQL implementation of the session store and history log.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{SESSION_COLUMNS, SessionRow};
use super::{HistoryLog, SessionFilter, SessionPatch, SessionStore};
use crate::config::DatabaseConfig;
use crate::domain::{HistoryRecord, Session};
use crate::error::StoreError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// Row-level locking gives the per-session atomicity the registry relies
/// on: `find_one_and_update` locks its target with `FOR UPDATE` and
/// `delete_many` is a single `DELETE ... RETURNING` statement.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn create(&self, session: Session) -> Result<Session, StoreError> {
        let sql = format!(
            "INSERT INTO active_sessions \
             (session_id, connected_at, client_kind, linked_window_id, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session.session_id.as_str())
            .bind(session.connected_at)
            .bind(&session.client_kind)
            .bind(session.linked_window_id().map(|id| id.as_str()))
            .bind(&session.data)
            .bind(session.created_at)
            .bind(session.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::Duplicate(session.session_id.clone())
                }
                other => StoreError::from(other),
            })?;
        Ok(Session::from(row))
    }

    async fn find_one_and_update(
        &self,
        filter: &SessionFilter,
        patch: &SessionPatch,
    ) -> Result<Option<Session>, StoreError> {
        let mut qb = update_query(filter, patch);
        let row = qb
            .build_query_as::<SessionRow>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Session::from))
    }

    async fn delete_many(&self, filter: &SessionFilter) -> Result<Vec<Session>, StoreError> {
        let mut qb = delete_query(filter);
        let rows = qb
            .build_query_as::<SessionRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn list(&self) -> Result<Vec<Session>, StoreError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM active_sessions ORDER BY connected_at ASC");
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }
}

#[async_trait]
impl HistoryLog for PostgresStore {
    async fn append(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO session_history \
             (session_id, connected_at, client_kind, linked_window_id, data, closed_by, closed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.session_id.as_str())
        .bind(record.connected_at)
        .bind(&record.client_kind)
        .bind(record.linked_window_id.as_ref().map(|id| id.as_str()))
        .bind(&record.data)
        .bind(record.closed_by.as_str())
        .bind(record.closed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Renders `filter` as a SQL boolean expression with bound parameters.
fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &SessionFilter) {
    match filter {
        SessionFilter::SessionId(id) => {
            qb.push("session_id = ").push_bind(id.to_string());
        }
        SessionFilter::LinkedWindow(id) => {
            qb.push("linked_window_id = ").push_bind(id.to_string());
        }
        SessionFilter::Any(filters) if filters.is_empty() => {
            qb.push("FALSE");
        }
        SessionFilter::Any(filters) => {
            qb.push("(");
            for (i, inner) in filters.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_filter(qb, inner);
            }
            qb.push(")");
        }
    }
}

/// Builds a single-row `UPDATE` that locks the first matching session.
fn update_query(filter: &SessionFilter, patch: &SessionPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE active_sessions SET ");
    match patch {
        SessionPatch::Link(window_id) => {
            qb.push("linked_window_id = ").push_bind(window_id.to_string());
        }
        SessionPatch::Unlink => {
            qb.push("linked_window_id = NULL");
        }
        SessionPatch::SetData(data) => {
            qb.push("data = ").push_bind(data.clone());
        }
    }
    qb.push(
        ", updated_at = now() WHERE session_id = \
         (SELECT session_id FROM active_sessions WHERE ",
    );
    push_filter(&mut qb, filter);
    qb.push(" LIMIT 1 FOR UPDATE) RETURNING ");
    qb.push(SESSION_COLUMNS);
    qb
}

/// Builds a `DELETE ... RETURNING` for every matching session.
fn delete_query(filter: &SessionFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("DELETE FROM active_sessions WHERE ");
    push_filter(&mut qb, filter);
    qb.push(" RETURNING ");
    qb.push(SESSION_COLUMNS);
    qb
}
