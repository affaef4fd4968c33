//! Shared Error Types
//!
//! This module defines error types that are shared between the engine and the
//! server. They describe failures that happen before any state is touched:
//! malformed payloads and composite intents that cannot be built.
//!
//! # Error Categories
//!
//! - `ValidationError` - every violated field of a rejected payload
//! - `EngineError` - a composite intent (group, ungroup, align) that cannot be built
//! - `SharedError` - umbrella over both plus serialization failures
//!
//! # Usage
//!
//! ```rust
//! use xfcanvas::shared::error::{FieldIssue, ValidationError};
//!
//! let error = ValidationError::new(vec![FieldIssue::new("nodes[0].width", "must be at least 1")]);
//! assert_eq!(error.issues.len(), 1);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated constraint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldIssue {
    /// Location of the field, e.g. `[2].node.fill`
    pub path: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Payload rejected by the validation layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} validation issue(s): {}", .issues.len(), join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// Error carrying a single issue
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldIssue::new(path, message)])
    }

    /// Whether any issue points at `path`
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// A composite intent that cannot be turned into an operation batch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Grouping needs at least two distinct nodes
    #[error("grouping requires at least 2 nodes, got {count}")]
    GroupTooSmall { count: usize },

    /// A referenced node does not exist
    #[error("unknown node '{id}'")]
    UnknownNode { id: String },

    /// The node has no children to ungroup
    #[error("node '{id}' is not a container")]
    NotAContainer { id: String },
}

/// Shared error types that can occur in both the engine and the server
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
