//! State snapshots and the fetcher that produces them.
//!
//! A snapshot is built from exactly one downloaded byte sequence. Its digest
//! and its transfer encoding are both derived from those bytes at
//! construction time and cannot be set independently.

use std::fmt;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use md5::{Digest, Md5};
use serde::Deserialize;
use serde_json::Value;

use stateshift_core::{ControlPlaneClient, ControlPlaneError, StateVersionPayload, WorkspaceId};

use crate::error::{timeout_or, MigrationError, SnapshotParseError};

// ---------------------------------------------------------------------------
// StateSnapshot
// ---------------------------------------------------------------------------

/// The current state of one workspace, immutable after download.
#[derive(Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    serial: u64,
    lineage: String,
    raw: Vec<u8>,
    digest: String,
    encoded: String,
}

/// The only fields read out of a state document. Typed after parsing so a
/// wrong type is reported against its field.
#[derive(Deserialize)]
struct Bookkeeping {
    serial: Option<Value>,
    lineage: Option<Value>,
}

impl StateSnapshot {
    /// Build a snapshot from raw downloaded bytes.
    pub fn from_raw(raw: Vec<u8>) -> Result<Self, SnapshotParseError> {
        let fields: Bookkeeping = serde_json::from_slice(&raw)?;
        let serial = fields
            .serial
            .ok_or(SnapshotParseError::MissingField("serial"))?
            .as_u64()
            .ok_or(SnapshotParseError::InvalidField {
                field: "serial",
                expected: "a non-negative integer",
            })?;
        // An empty lineage is passed through; the control plane judges it.
        let lineage = match fields.lineage {
            None => return Err(SnapshotParseError::MissingField("lineage")),
            Some(Value::String(lineage)) => lineage,
            Some(_) => {
                return Err(SnapshotParseError::InvalidField {
                    field: "lineage",
                    expected: "a string",
                })
            }
        };

        // Fresh hasher per snapshot.
        let digest = hex::encode(Md5::digest(&raw));
        let encoded = BASE64_STANDARD.encode(&raw);

        Ok(Self {
            serial,
            lineage,
            raw,
            digest,
            encoded,
        })
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn lineage(&self) -> &str {
        &self.lineage
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Lowercase hex MD5 of [`raw`](Self::raw).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Standard base64 of [`raw`](Self::raw).
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The state-version attributes to submit to a target workspace.
    /// Serial and lineage pass through unchanged.
    pub fn payload(&self) -> StateVersionPayload {
        StateVersionPayload {
            serial: self.serial,
            md5: self.digest.clone(),
            lineage: self.lineage.clone(),
            state: self.encoded.clone(),
        }
    }
}

impl fmt::Debug for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSnapshot")
            .field("serial", &self.serial)
            .field("lineage", &self.lineage)
            .field("digest", &self.digest)
            .field("bytes", &self.raw.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SnapshotFetcher
// ---------------------------------------------------------------------------

/// Reads a workspace's current state: pointer first, then content.
pub struct SnapshotFetcher<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ControlPlaneClient + ?Sized> SnapshotFetcher<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Fetch the current state of `workspace`.
    ///
    /// `Ok(None)` when the workspace has never had a state version.
    pub fn fetch(&self, workspace: &WorkspaceId) -> Result<Option<StateSnapshot>, MigrationError> {
        let Some(pointer) = self
            .client
            .current_state_version(workspace)
            .map_err(|e| unavailable(workspace, e))?
        else {
            tracing::debug!(%workspace, "no current state version");
            return Ok(None);
        };

        let raw = self
            .client
            .download_state(&pointer.download_url)
            .map_err(|e| unavailable(workspace, e))?;

        let snapshot =
            StateSnapshot::from_raw(raw).map_err(|e| MigrationError::SnapshotMalformed {
                workspace: workspace.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            %workspace,
            serial = snapshot.serial(),
            lineage = snapshot.lineage(),
            digest = snapshot.digest(),
            bytes = snapshot.raw().len(),
            "state fetched"
        );
        Ok(Some(snapshot))
    }
}

fn unavailable(workspace: &WorkspaceId, err: ControlPlaneError) -> MigrationError {
    timeout_or(err, workspace, |e| match e {
        ControlPlaneError::Decode { reason, .. } => MigrationError::SnapshotMalformed {
            workspace: workspace.clone(),
            reason,
        },
        source => MigrationError::SnapshotUnavailable {
            workspace: workspace.clone(),
            source,
        },
    })
}
