//! Submits a fetched snapshot as a new state version of a workspace.

use stateshift_core::{ControlPlaneClient, WorkspaceId};

use crate::error::{timeout_or, MigrationError};
use crate::snapshot::StateSnapshot;

pub struct StatePublisher<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ControlPlaneClient + ?Sized> StatePublisher<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Publish `snapshot` to `workspace`.
    ///
    /// Serial and lineage are sent exactly as fetched; lineage conflicts
    /// with the target's own history are left to the control plane.
    pub fn publish(&self, workspace: &WorkspaceId, snapshot: &StateSnapshot) -> Result<(), MigrationError> {
        let payload = snapshot.payload();
        tracing::debug!(
            %workspace,
            serial = payload.serial,
            lineage = %payload.lineage,
            md5 = %payload.md5,
            "publishing state version"
        );
        self.client
            .create_state_version(workspace, &payload)
            .map_err(|e| {
                timeout_or(e, workspace, |source| MigrationError::PublishRejected {
                    workspace: workspace.clone(),
                    source,
                })
            })
    }
}
