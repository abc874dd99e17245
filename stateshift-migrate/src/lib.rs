//! # stateshift-migrate
//!
//! Moves the current state of every workspace in one organization to the
//! workspace of the same name in another.
//!
//! Build a [`Migrator`] over any [`ControlPlaneClient`](stateshift_core::ControlPlaneClient)
//! and call [`Migrator::run`]. The returned [`MigrationReport`] holds one
//! [`MigrationRecord`] per source workspace; hand it to a [`ReportSink`]
//! such as [`CsvReportSink`] to persist it.

pub mod directory;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod publish;
pub mod report;
pub mod snapshot;

pub use directory::{Directory, WorkspaceDirectory};
pub use error::{MigrationError, ReportError, SnapshotParseError};
pub use lock::{HeldLock, LockChange, LockCoordinator, ScopeLockOutcome};
pub use orchestrator::Migrator;
pub use publish::StatePublisher;
pub use report::{
    save_csv, CsvReportSink, MigrationRecord, MigrationReport, MigrationStatus, ReportSink,
    ReportSummary, CSV_COLUMNS,
};
pub use snapshot::{SnapshotFetcher, StateSnapshot};
