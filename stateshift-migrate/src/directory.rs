//! Workspace directory: one organization's workspaces keyed by name.

use indexmap::IndexMap;

use stateshift_core::{ControlPlaneClient, ControlPlaneError, OrgName, WorkspaceDescriptor, WorkspaceName};

use crate::error::{timeout_or, MigrationError};

/// Workspaces of one scope, in listing order, keyed by exact name.
pub type Directory = IndexMap<WorkspaceName, WorkspaceDescriptor>;

/// Read-only view of the control plane's workspace listings.
pub struct WorkspaceDirectory<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ControlPlaneClient + ?Sized> WorkspaceDirectory<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// List the workspaces of `org`.
    ///
    /// A transport failure or non-success status is
    /// [`MigrationError::DirectoryUnavailable`]; a response missing the
    /// name, id or lock flag of any entry is
    /// [`MigrationError::DirectoryMalformed`].
    pub fn list(&self, org: &OrgName) -> Result<Directory, MigrationError> {
        let listing = self.client.list_workspaces(org).map_err(|e| {
            timeout_or(e, org, |e| match e {
                ControlPlaneError::Decode { reason, .. } => MigrationError::DirectoryMalformed {
                    scope: org.to_string(),
                    reason,
                },
                source => MigrationError::DirectoryUnavailable {
                    scope: org.to_string(),
                    source,
                },
            })
        })?;

        if let Some(bad) = listing
            .iter()
            .find(|ws| ws.name.0.is_empty() || ws.id.0.is_empty())
        {
            return Err(MigrationError::DirectoryMalformed {
                scope: org.to_string(),
                reason: format!("entry with empty name or id (name='{}', id='{}')", bad.name, bad.id),
            });
        }

        let directory = index_by_name(listing);
        tracing::debug!(%org, workspaces = directory.len(), "directory listed");
        Ok(directory)
    }
}

/// Key a listing by name, keeping first-seen order.
///
/// Names are unique within a scope; should the control plane ever return a
/// duplicate, the later entry replaces the earlier one in place.
pub fn index_by_name(listing: Vec<WorkspaceDescriptor>) -> Directory {
    let mut directory = Directory::with_capacity(listing.len());
    for ws in listing {
        let name = ws.name.clone();
        if let Some(previous) = directory.insert(name, ws) {
            tracing::warn!(
                workspace = %previous.name,
                replaced_id = %previous.id,
                "duplicate workspace name in listing; keeping the later entry"
            );
        }
    }
    directory
}
