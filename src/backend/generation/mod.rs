//! Operation Generation
//!
//! An external assistant can propose edits from a free-text instruction.
//! The assistant itself lives behind the `OperationGenerator` trait; this
//! module only awaits it, bounds the wait, validates what comes back and
//! hands the result to the ordinary submit path.
//!
//! # Critical Section
//!
//! The generator runs before any writer lock is taken, so a slow assistant
//! never blocks human edits. The proposed batch is planned against the
//! snapshot current at request time and applied with the same per-batch
//! semantics as any other submission.
//!
//! # Failure Categories
//!
//! `GenerationError` separates timeouts, malformed output, rejected
//! credentials, upstream faults and a missing generator so the caller can
//! decide whether a retry makes sense.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::backend::collab::service::{Applied, DocumentService};
use crate::backend::error::BackendError;
use crate::shared::validation::validate_operations;
use crate::shared::node::is_valid_color;
use crate::shared::{Document, FieldIssue, ValidationError};

/// Longest accepted instruction, in characters
pub const MAX_INSTRUCTION_LEN: usize = 4000;

/// Most colors a palette may carry
pub const MAX_PALETTE_LEN: usize = 32;

/// What the generator is asked to do
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub snapshot: Arc<Document>,
    pub instruction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The generator answered with something that is not a valid batch
    #[error("generator returned invalid operations: {message}")]
    InvalidOutput { message: String },

    #[error("generator rejected our credentials")]
    Unauthorized,

    #[error("generator failed: {message}")]
    Upstream { message: String },

    #[error("no generator is configured")]
    Unavailable,
}

impl GenerationError {
    /// Whether repeating the same request could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Upstream { .. })
    }
}

/// External assistant that turns an instruction into a raw operation array
///
/// The returned value is untrusted; it goes through the same validation as
/// a client-submitted batch.
pub trait OperationGenerator: Send + Sync {
    fn generate(&self, request: GenerationRequest) -> BoxFuture<'static, Result<serde_json::Value, GenerationError>>;
}

/// Check an instruction and optional palette before calling out
pub fn check_request(instruction: &str, palette: Option<&[String]>) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        issues.push(FieldIssue::new("instruction", "must not be empty"));
    } else if trimmed.chars().count() > MAX_INSTRUCTION_LEN {
        issues.push(FieldIssue::new(
            "instruction",
            format!("must be at most {} characters", MAX_INSTRUCTION_LEN),
        ));
    }

    if let Some(palette) = palette {
        if palette.len() > MAX_PALETTE_LEN {
            issues.push(FieldIssue::new(
                "palette",
                format!("must contain at most {} colors", MAX_PALETTE_LEN),
            ));
        }
        for (i, color) in palette.iter().enumerate() {
            if !is_valid_color(color) {
                issues.push(FieldIssue::new(
                    format!("palette[{}]", i),
                    format!("'{}' is not a valid color", color),
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}

/// Ask the generator for a batch and apply it to `doc_id`
pub async fn generate_and_apply(
    service: &DocumentService,
    generator: Option<&dyn OperationGenerator>,
    doc_id: &str,
    instruction: String,
    palette: Option<Vec<String>>,
    timeout: Duration,
) -> Result<Applied, BackendError> {
    check_request(&instruction, palette.as_deref())?;
    let generator = generator.ok_or(GenerationError::Unavailable)?;
    let snapshot = service.get(doc_id)?;

    tracing::info!(
        "[Generation] Requesting operations for {} at version {}",
        doc_id,
        snapshot.version
    );
    let request = GenerationRequest {
        snapshot,
        instruction,
        palette,
    };

    let raw = match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            tracing::warn!("[Generation] Generator failed for {}: {}", doc_id, e);
            return Err(e.into());
        }
        Err(_) => {
            tracing::warn!("[Generation] Generator timed out for {}", doc_id);
            return Err(GenerationError::Timeout {
                secs: timeout.as_secs(),
            }
            .into());
        }
    };

    let ops = validate_operations(&raw).map_err(|e| GenerationError::InvalidOutput {
        message: e.to_string(),
    })?;

    let applied = service.submit(doc_id, ops).await?;
    tracing::info!(
        "[Generation] Applied {} generated ops to {} (version {})",
        applied.ops.len(),
        doc_id,
        applied.version
    );
    Ok(applied)
}
