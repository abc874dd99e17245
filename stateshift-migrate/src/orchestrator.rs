//! Migration orchestrator.
//!
//! ## Per-workspace sequence
//!
//! 1. Pair the source workspace with the target of the same name. No
//!    target: FAILED, nothing is called.
//! 2. Optionally lock the source (`lock_source`).
//! 3. Fetch the source's current state. None: SKIPPED.
//! 4. Lock the target unless it is already locked.
//! 5. Publish the snapshot to the target.
//! 6. Release the target lock if step 4 took it, whether or not step 5
//!    succeeded.
//! 7. Settle the source lock (`unlock_source`).
//!
//! Errors inside the sequence end that workspace as FAILED and the run moves
//! on. Only the two directory listings can fail a run.
//!
//! Pairs run one after another, so two sources resolving to the same target
//! id are migrated in listing order and never overlap.

use stateshift_core::{ControlPlaneClient, LockAction, MigrationOptions, WorkspaceDescriptor, WorkspaceId};

use crate::directory::{Directory, WorkspaceDirectory};
use crate::error::{timeout_or, MigrationError};
use crate::lock::{HeldLock, LockCoordinator};
use crate::publish::StatePublisher;
use crate::report::{MigrationRecord, MigrationReport, MigrationStatus, PendingRecord};
use crate::snapshot::{SnapshotFetcher, StateSnapshot};

pub const DETAIL_TARGET_NOT_FOUND: &str = "target workspace not found";
pub const DETAIL_NO_STATE: &str = "no current state version";

/// Drives migrations between two organizations.
pub struct Migrator<'a, C: ControlPlaneClient + ?Sized> {
    client: &'a C,
    options: MigrationOptions,
}

/// Where one workspace's sequence ended, before it becomes a record.
struct Outcome {
    status: MigrationStatus,
    detail: String,
    snapshot: Option<StateSnapshot>,
}

impl Outcome {
    fn failed(error: &MigrationError, snapshot: Option<StateSnapshot>) -> Self {
        Self {
            status: MigrationStatus::Failed,
            detail: error.to_string(),
            snapshot,
        }
    }

    /// Fold a failure of a cleanup step into an otherwise finished outcome.
    fn with_cleanup_failure(mut self, what: &str, error: &MigrationError) -> Self {
        self.detail = match self.status {
            MigrationStatus::Failed => format!("{}; also failed to {what}: {error}", self.detail),
            _ => format!("{}, but failed to {what}: {error}", self.detail),
        };
        self.status = MigrationStatus::Failed;
        self
    }
}

impl<'a, C: ControlPlaneClient + ?Sized> Migrator<'a, C> {
    pub fn new(client: &'a C, options: MigrationOptions) -> Self {
        Self { client, options }
    }

    /// Migrate every workspace of the source organization.
    pub fn run(&self) -> Result<MigrationReport, MigrationError> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), calling `on_record` as each workspace
    /// finishes.
    pub fn run_with(
        &self,
        mut on_record: impl FnMut(&MigrationRecord),
    ) -> Result<MigrationReport, MigrationError> {
        let directory = WorkspaceDirectory::new(self.client);
        let sources = directory.list(&self.options.source_org)?;
        let targets = directory.list(&self.options.target_org)?;
        tracing::info!(
            source_org = %self.options.source_org,
            target_org = %self.options.target_org,
            sources = sources.len(),
            targets = targets.len(),
            "starting migration"
        );

        let mut report = MigrationReport::new();
        for source in sources.values() {
            let record = self.migrate_named(source, &targets);
            on_record(&record);
            report.append(record);
        }
        report.finish();

        let summary = report.summary();
        tracing::info!(
            migrated = summary.migrated,
            skipped = summary.skipped,
            failed = summary.failed,
            "migration finished"
        );
        Ok(report)
    }

    /// Migrate one workspace pair given by id, bypassing name pairing.
    pub fn migrate_by_id(
        &self,
        source_id: &WorkspaceId,
        target_id: &WorkspaceId,
    ) -> Result<MigrationReport, MigrationError> {
        let source = self.show(source_id)?;
        let target = self.show(target_id)?;

        let mut report = MigrationReport::new();
        let pending = PendingRecord::new(&self.options.source_org, &self.options.target_org, &source)
            .target(&target.id);
        report.append(self.migrate_pair(pending, &source, &target));
        report.finish();
        Ok(report)
    }

    fn show(&self, id: &WorkspaceId) -> Result<WorkspaceDescriptor, MigrationError> {
        self.client.show_workspace(id).map_err(|e| {
            timeout_or(e, id, |source| MigrationError::DirectoryUnavailable {
                scope: id.to_string(),
                source,
            })
        })
    }

    fn migrate_named(
        &self,
        source: &WorkspaceDescriptor,
        targets: &Directory,
    ) -> MigrationRecord {
        let pending = PendingRecord::new(&self.options.source_org, &self.options.target_org, source);

        let Some(target) = targets.get(&source.name) else {
            tracing::warn!(workspace = %source.name, "no target workspace with this name");
            return pending.seal(MigrationStatus::Failed, DETAIL_TARGET_NOT_FOUND);
        };
        let pending = pending.target(&target.id);
        self.migrate_pair(pending, source, target)
    }

    fn migrate_pair(
        &self,
        pending: PendingRecord,
        source: &WorkspaceDescriptor,
        target: &WorkspaceDescriptor,
    ) -> MigrationRecord {
        let locks = LockCoordinator::new(self.client);

        let source_lock = if self.options.lock_source {
            match locks.acquire(source) {
                Ok(guard) => Some(guard),
                Err(e) => return self.seal(pending, Outcome::failed(&e, None)),
            }
        } else {
            None
        };

        let mut outcome = self.transfer(&locks, source, target);

        if let Err(e) = self.settle_source(&locks, source, source_lock) {
            outcome = outcome.with_cleanup_failure("release source workspace", &e);
        }

        self.seal(pending, outcome)
    }

    /// Fetch, lock target, publish, unlock target.
    fn transfer(
        &self,
        locks: &LockCoordinator<'a, C>,
        source: &WorkspaceDescriptor,
        target: &WorkspaceDescriptor,
    ) -> Outcome {
        let snapshot = match SnapshotFetcher::new(self.client).fetch(&source.id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return Outcome {
                    status: MigrationStatus::Skipped,
                    detail: DETAIL_NO_STATE.to_string(),
                    snapshot: None,
                }
            }
            Err(e) => return Outcome::failed(&e, None),
        };

        let target_lock = match locks.acquire(target) {
            Ok(guard) => guard,
            Err(e) => return Outcome::failed(&e, Some(snapshot)),
        };

        let published = StatePublisher::new(self.client).publish(&target.id, &snapshot);
        let released = target_lock.release();

        match (published, released) {
            (Ok(()), Ok(())) => Outcome {
                status: MigrationStatus::Migrated,
                detail: format!(
                    "migrated serial {} (lineage {})",
                    snapshot.serial(),
                    snapshot.lineage()
                ),
                snapshot: Some(snapshot),
            },
            (Ok(()), Err(e)) => Outcome {
                status: MigrationStatus::Migrated,
                detail: format!("published serial {}", snapshot.serial()),
                snapshot: Some(snapshot),
            }
            .with_cleanup_failure("unlock target workspace", &e),
            (Err(e), Ok(())) => Outcome::failed(&e, Some(snapshot)),
            (Err(e), Err(unlock)) => Outcome::failed(&e, Some(snapshot))
                .with_cleanup_failure("unlock target workspace", &unlock),
        }
    }

    /// Apply `unlock_source` to the source workspace.
    fn settle_source(
        &self,
        locks: &LockCoordinator<'a, C>,
        source: &WorkspaceDescriptor,
        guard: Option<HeldLock<'a, C>>,
    ) -> Result<(), MigrationError> {
        match (guard, self.options.unlock_source) {
            (Some(guard), false) => {
                guard.keep();
                Ok(())
            }
            (Some(guard), true) => {
                let acquired = guard.acquired();
                guard.release()?;
                if !acquired {
                    locks.set_lock(&source.id, LockAction::Unlock)?;
                }
                Ok(())
            }
            (None, true) => locks.ensure(source, LockAction::Unlock).map(|_| ()),
            (None, false) => Ok(()),
        }
    }

    fn seal(&self, pending: PendingRecord, outcome: Outcome) -> MigrationRecord {
        let pending = match &outcome.snapshot {
            Some(snapshot) => pending.snapshot(snapshot),
            None => pending,
        };
        let record = pending.seal(outcome.status, outcome.detail);
        match record.status {
            MigrationStatus::Failed => {
                tracing::warn!(workspace = %record.workspace_name, "FAILED: {}", record.detail)
            }
            status => {
                tracing::info!(workspace = %record.workspace_name, %status, "{}", record.detail)
            }
        }
        record
    }
}
