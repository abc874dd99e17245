//! Workspace locking.
//!
//! [`LockCoordinator::ensure`] only calls the control plane when the
//! workspace's known lock flag differs from the desired one, so an
//! already-locked workspace is never locked twice.
//!
//! [`HeldLock`] is the scoped form used around a mutating write: it remembers
//! whether *this* run took the lock and releases it on
//! [`HeldLock::release`] or, failing that, on drop. A pre-existing lock is
//! never released.

use stateshift_core::{ControlPlaneClient, LockAction, WorkspaceDescriptor, WorkspaceId};

use crate::directory::Directory;
use crate::error::{timeout_or, MigrationError};

/// HTTP status the control plane uses for "locked by someone else".
const CONFLICT: u16 = 409;

/// What [`LockCoordinator::ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockChange {
    /// The control plane was called and the lock flag changed.
    Applied,
    /// The workspace already had the desired lock flag; no call was made.
    AlreadyInState,
}

/// Acquires and releases workspace locks.
pub struct LockCoordinator<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> Clone for LockCoordinator<'a, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
        }
    }
}

impl<'a, C: ControlPlaneClient + ?Sized> LockCoordinator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Issue one lock or unlock call, unconditionally.
    pub fn set_lock(&self, workspace: &WorkspaceId, action: LockAction) -> Result<(), MigrationError> {
        tracing::debug!(%workspace, %action, "setting lock");
        self.client.set_lock(workspace, action).map_err(|e| {
            timeout_or(e, workspace, |source| {
                if source.status_code() == Some(CONFLICT) {
                    MigrationError::LockConflict {
                        workspace: workspace.clone(),
                        source,
                    }
                } else {
                    MigrationError::LockFailed {
                        workspace: workspace.clone(),
                        action,
                        source,
                    }
                }
            })
        })
    }

    /// Bring `workspace` to the desired lock state, skipping the call when
    /// its known flag already matches.
    pub fn ensure(
        &self,
        workspace: &WorkspaceDescriptor,
        action: LockAction,
    ) -> Result<LockChange, MigrationError> {
        if action.is_satisfied_by(workspace.locked) {
            tracing::debug!(workspace = %workspace.id, %action, "lock already in desired state");
            return Ok(LockChange::AlreadyInState);
        }
        self.set_lock(&workspace.id, action)?;
        Ok(LockChange::Applied)
    }

    /// Lock `workspace` for the duration of the returned guard.
    pub fn acquire(&self, workspace: &WorkspaceDescriptor) -> Result<HeldLock<'a, C>, MigrationError> {
        let change = self.ensure(workspace, LockAction::Lock)?;
        Ok(HeldLock {
            coordinator: self.clone(),
            workspace: workspace.id.clone(),
            acquired: change == LockChange::Applied,
            settled: false,
        })
    }

    /// Apply `action` to every workspace of a directory.
    ///
    /// Workspaces already in the desired state are skipped; a failure on one
    /// workspace does not stop the others.
    pub fn apply_to_directory(&self, directory: &Directory, action: LockAction) -> Vec<ScopeLockOutcome> {
        directory
            .values()
            .map(|ws| {
                let result = self.ensure(ws, action);
                match &result {
                    Ok(change) => tracing::info!(workspace = %ws.name, %action, ?change, "lock state ensured"),
                    Err(e) => tracing::warn!(workspace = %ws.name, %action, "lock failed: {e}"),
                }
                ScopeLockOutcome {
                    workspace: ws.clone(),
                    result,
                }
            })
            .collect()
    }
}

/// Result of applying a lock action to one workspace of a scope.
#[derive(Debug)]
pub struct ScopeLockOutcome {
    pub workspace: WorkspaceDescriptor,
    pub result: Result<LockChange, MigrationError>,
}

// ---------------------------------------------------------------------------
// HeldLock
// ---------------------------------------------------------------------------

/// A lock held around a mutating step.
///
/// Settle it with [`release`](Self::release) or [`keep`](Self::keep). If it
/// is dropped unsettled (early return, panic) a lock this run acquired is
/// released on a best-effort basis.
#[must_use = "an unsettled lock is released on drop"]
pub struct HeldLock<'a, C: ControlPlaneClient + ?Sized> {
    coordinator: LockCoordinator<'a, C>,
    workspace: WorkspaceId,
    acquired: bool,
    settled: bool,
}

impl<'a, C: ControlPlaneClient + ?Sized> HeldLock<'a, C> {
    /// Whether this guard took the lock (as opposed to finding it held).
    pub fn acquired(&self) -> bool {
        self.acquired
    }

    /// Release the lock if this guard acquired it.
    pub fn release(mut self) -> Result<(), MigrationError> {
        self.settled = true;
        if !self.acquired {
            return Ok(());
        }
        self.coordinator.set_lock(&self.workspace, LockAction::Unlock)
    }

    /// Leave the workspace locked.
    pub fn keep(mut self) {
        self.settled = true;
        tracing::debug!(workspace = %self.workspace, "leaving workspace locked");
    }
}

impl<'a, C: ControlPlaneClient + ?Sized> Drop for HeldLock<'a, C> {
    fn drop(&mut self) {
        if self.settled || !self.acquired {
            return;
        }
        tracing::warn!(workspace = %self.workspace, "lock dropped unsettled; releasing");
        if let Err(e) = self.coordinator.set_lock(&self.workspace, LockAction::Unlock) {
            tracing::warn!(workspace = %self.workspace, "best-effort unlock failed: {e}");
        }
    }
}
