//! Error types with wire and HTTP mappings.
//!
//! [`StoreError`] is returned by session store backends. [`PresenceError`]
//! is the registry-level error: each variant maps to the [`ErrorKind`]
//! reported to a WebSocket endpoint and, for the REST surface, to an HTTP
//! status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EndpointId, ErrorKind};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 3001,
///     "message": "storage error: connection refused"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Failure reported by a session store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A session with the same id is already active.
    #[error("session {0} already exists")]
    Duplicate(EndpointId),

    /// The backing database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Registry error with wire-kind and HTTP status mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status               |
/// |-----------|------------|---------------------------|
/// | 1000–1999 | Validation | 400 Bad Request           |
/// | 2000–2999 | Not Found  | 404 Not Found             |
/// | 3000–3999 | Server     | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// A required payload field was missing or the frame was malformed.
    #[error("{0}")]
    Validation(String),

    /// An inspector referenced a session that is not active.
    #[error("session {0} not found")]
    SessionNotFound(EndpointId),

    /// The store failed while linking an inspector to `target`.
    #[error("could not link session {target}: {source}")]
    LinkFailed {
        /// Session the inspector tried to attach to.
        target: EndpointId,
        /// Underlying store failure.
        source: StoreError,
    },

    /// Session store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl PresenceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::SessionNotFound(_) => 2001,
            Self::LinkFailed { .. } => 3003,
            Self::Storage(StoreError::Duplicate(_)) => 3002,
            Self::Storage(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::LinkFailed { .. } | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the category reported to the originating endpoint.
    ///
    /// Every inspector link failure, including a missing target, is
    /// reported as a storage-layer failure, never as a validation error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::SessionNotFound(_) | Self::LinkFailed { .. } => ErrorKind::DbConnection,
            Self::Storage(_) => ErrorKind::Db,
        }
    }
}

impl IntoResponse for PresenceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
