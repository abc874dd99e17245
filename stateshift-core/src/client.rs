//! The control-plane capability consumed by the migration engine.

use crate::error::ControlPlaneError;
use crate::types::{
    LockAction, OrgName, StateVersionPayload, StateVersionPointer, WorkspaceDescriptor,
    WorkspaceId,
};

/// Remote state-management API.
///
/// Every method performs exactly one remote call and never retries.
pub trait ControlPlaneClient {
    /// List the workspaces of `org` (single page).
    fn list_workspaces(&self, org: &OrgName) -> Result<Vec<WorkspaceDescriptor>, ControlPlaneError>;

    /// Look up one workspace by id.
    fn show_workspace(&self, id: &WorkspaceId) -> Result<WorkspaceDescriptor, ControlPlaneError>;

    /// Resolve the current state version of a workspace.
    ///
    /// `Ok(None)` when the workspace has never had a state version.
    fn current_state_version(
        &self,
        id: &WorkspaceId,
    ) -> Result<Option<StateVersionPointer>, ControlPlaneError>;

    /// Download raw state bytes from a location returned by
    /// [`current_state_version`](Self::current_state_version).
    fn download_state(&self, url: &str) -> Result<Vec<u8>, ControlPlaneError>;

    fn create_state_version(
        &self,
        id: &WorkspaceId,
        payload: &StateVersionPayload,
    ) -> Result<(), ControlPlaneError>;

    fn set_lock(&self, id: &WorkspaceId, action: LockAction) -> Result<(), ControlPlaneError>;
}
