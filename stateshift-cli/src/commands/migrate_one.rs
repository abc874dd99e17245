//! `stateshift migrate-one`: migrate a single workspace pair by id.

use anyhow::{Context, Result};
use clap::Args;

use stateshift_core::{SettingsLayer, WorkspaceId};
use stateshift_migrate::Migrator;

use super::migrate::{print_record, ReportOutputArgs};
use super::{connect, resolve, ConnectionArgs};

/// Arguments for `stateshift migrate-one`.
#[derive(Args, Debug)]
pub struct MigrateOneArgs {
    /// Id of the workspace to read state from (`ws-…`).
    #[arg(long)]
    pub source_id: String,

    /// Id of the workspace to publish state to.
    #[arg(long)]
    pub target_id: String,

    /// Lock the source workspace before reading its state.
    #[arg(long)]
    pub lock_source: bool,

    /// Unlock the source workspace afterwards.
    #[arg(long)]
    pub unlock_source: bool,

    #[command(flatten)]
    pub output: ReportOutputArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl MigrateOneArgs {
    pub fn run(self) -> Result<()> {
        let flags = SettingsLayer {
            lock_source: self.lock_source.then_some(true),
            unlock_source: self.unlock_source.then_some(true),
            ..self.connection.layer()
        };
        let settings = resolve(flags)?;
        let client = connect(&settings)?;

        let source = WorkspaceId::from(self.source_id.as_str());
        let target = WorkspaceId::from(self.target_id.as_str());
        let report = Migrator::new(&client, settings.labelled_options())
            .migrate_by_id(&source, &target)
            .with_context(|| format!("cannot migrate {source} to {target}"))?;

        if !self.output.json {
            for record in report.all() {
                print_record(record);
            }
        }
        self.output.emit(&report)
    }
}
