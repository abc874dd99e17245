//! Error types for stateshift-migrate.

use std::path::PathBuf;

use thiserror::Error;

use stateshift_core::{ControlPlaneError, LockAction, WorkspaceId};

/// Everything that can go wrong while migrating.
///
/// Directory variants abort a run. Every other variant is caught at the
/// workspace boundary and recorded as a FAILED row.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("workspace directory for '{scope}' unavailable: {source}")]
    DirectoryUnavailable {
        scope: String,
        #[source]
        source: ControlPlaneError,
    },

    #[error("workspace directory for '{scope}' malformed: {reason}")]
    DirectoryMalformed { scope: String, reason: String },

    #[error("state of {workspace} unavailable: {source}")]
    SnapshotUnavailable {
        workspace: WorkspaceId,
        #[source]
        source: ControlPlaneError,
    },

    #[error("state of {workspace} malformed: {reason}")]
    SnapshotMalformed {
        workspace: WorkspaceId,
        reason: String,
    },

    #[error("{workspace} is locked by another actor")]
    LockConflict {
        workspace: WorkspaceId,
        #[source]
        source: ControlPlaneError,
    },

    #[error("failed to {action} {workspace}: {source}")]
    LockFailed {
        workspace: WorkspaceId,
        action: LockAction,
        #[source]
        source: ControlPlaneError,
    },

    #[error("state version rejected by {workspace}: {source}")]
    PublishRejected {
        workspace: WorkspaceId,
        #[source]
        source: ControlPlaneError,
    },

    #[error("{operation} for {subject} timed out")]
    TransportTimeout { operation: String, subject: String },
}

/// Map a control-plane failure, turning timeouts into
/// [`MigrationError::TransportTimeout`] and everything else through `other`.
pub(crate) fn timeout_or(
    err: ControlPlaneError,
    subject: impl ToString,
    other: impl FnOnce(ControlPlaneError) -> MigrationError,
) -> MigrationError {
    match err {
        ControlPlaneError::Timeout { operation } => MigrationError::TransportTimeout {
            operation,
            subject: subject.to_string(),
        },
        err => other(err),
    }
}

/// A downloaded state document without usable bookkeeping fields.
#[derive(Debug, Error)]
pub enum SnapshotParseError {
    #[error("state is not a JSON document: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("state has no `{0}` field")]
    MissingField(&'static str),

    #[error("state field `{field}` is not {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Errors writing a report through a sink.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience constructor for [`ReportError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.into(),
        source,
    }
}
