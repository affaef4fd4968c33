/**
 * Backend Error Types
 *
 * This module defines the error type returned by every HTTP handler and by
 * the document service. Each variant maps to one HTTP status so callers can
 * tell a bad payload from a missing document or a stale write.
 *
 * # Error Categories
 *
 * ## Request Errors
 *
 * - Malformed payloads and unbuildable intents (`SharedError`)
 * - Missing documents (`NotFound`)
 * - Anything a handler rejects directly (`HandlerError`)
 *
 * ## Store Errors
 *
 * Out-of-order snapshot or history writes surface as 409 Conflict; they
 * indicate a second writer bypassed the per-document lock.
 *
 * ## Generation Errors
 *
 * Failures of the external generator keep their category so the caller can
 * decide whether to retry.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::collab::store::StoreError;
use crate::backend::generation::GenerationError;
use crate::shared::{EngineError, FieldIssue, SharedError, ValidationError};

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g. a malformed query string)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    #[error("document '{id}' not found")]
    NotFound { id: String },

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Validation or engine error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - validation failures - 400 Bad Request
    /// - unknown documents - 404 Not Found
    /// - out-of-order store writes - 409 Conflict
    /// - engine intents that cannot be built - 422 Unprocessable Entity
    /// - generator timeouts - 504, other generator faults 502, no generator 503
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(err) => match err {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::AlreadyExists { .. }
                | StoreError::VersionConflict { .. }
                | StoreError::HistoryGap { .. } => StatusCode::CONFLICT,
                StoreError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Generation(err) => match err {
                GenerationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                GenerationError::InvalidOutput { .. }
                | GenerationError::Unauthorized
                | GenerationError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                GenerationError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::SharedError(err) => match err {
                SharedError::Validation(_) => StatusCode::BAD_REQUEST,
                SharedError::Engine(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SharedError::SerializationError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Per-field diagnostics, when the error came from validation
    pub fn issues(&self) -> Option<&[FieldIssue]> {
        match self {
            Self::SharedError(SharedError::Validation(err)) => Some(&err.issues),
            _ => None,
        }
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id },
            other => Self::Store(other),
        }
    }
}

impl From<ValidationError> for BackendError {
    fn from(err: ValidationError) -> Self {
        Self::SharedError(err.into())
    }
}

impl From<EngineError> for BackendError {
    fn from(err: EngineError) -> Self {
        Self::SharedError(err.into())
    }
}
