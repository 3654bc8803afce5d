//! Domain-specific errors.

use std::time::Duration;

use thiserror::Error;

use crate::domain::model::{BufferTarget, TemplateNode};

/// Failures observed while keeping buffers in sync with the document model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("failed to load classes for {node}: {reason}")]
    LoadFailure { node: TemplateNode, reason: String },
    #[error("loading classes for {node} timed out after {}ms", .timeout.as_millis())]
    LoadTimeout { node: TemplateNode, timeout: Duration },
    #[error("code mutation service could not build a diff: {reason}")]
    DiffFailure { reason: String },
    #[error("code mutation service failed to apply the diff: {reason}")]
    ApplyFailure { reason: String },
    #[error("code mutation service rejected the change")]
    Rejected,
    #[error("selection was empty when reconciliation ran")]
    StaleSelection,
}

/// Illegal transitions of an edit buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("{0} buffer is committing")]
    Busy(BufferTarget),
    #[error("{0} buffer is not being edited")]
    NotEditing(BufferTarget),
}

/// Why a commit did not reach the document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("no element is selected")]
    NoSelection,
    #[error(transparent)]
    Service(#[from] SyncError),
}

impl SyncError {
    /// Render an `anyhow` chain on a single line for storage in a variant.
    pub(crate) fn reason(error: &anyhow::Error) -> String {
        format!("{error:#}")
    }
}
