//! `stateshift migrate`: migrate every same-named workspace.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stateshift_core::SettingsLayer;
use stateshift_migrate::{save_csv, MigrationRecord, MigrationReport, Migrator};

use super::{connect, resolve, status_label, ConnectionArgs};

/// Arguments for `stateshift migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Organization to read state from.
    #[arg(long, env = "SOURCE_ORG_NAME")]
    pub source_org: Option<String>,

    /// Organization to publish state to.
    #[arg(long, env = "TARGET_ORG_NAME")]
    pub target_org: Option<String>,

    /// Lock each source workspace before reading its state.
    #[arg(long)]
    pub lock_source: bool,

    /// Unlock each source workspace once it has been processed.
    #[arg(long)]
    pub unlock_source: bool,

    #[command(flatten)]
    pub output: ReportOutputArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Where the finished report goes.
#[derive(Args, Debug, Default)]
pub struct ReportOutputArgs {
    /// Also write the report as CSV to this path.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Print the report as JSON instead of the console view.
    #[arg(long)]
    pub json: bool,
}

impl MigrateArgs {
    pub fn run(self) -> Result<()> {
        let settings = resolve(self.layer())?;
        let options = settings
            .migration_options()
            .context("invalid migration settings")?;
        let client = connect(&settings)?;

        let json = self.output.json;
        if !json {
            println!(
                "Migrating {} → {}",
                options.source_org.to_string().bold(),
                options.target_org.to_string().bold()
            );
        }

        let report = Migrator::new(&client, options)
            .run_with(|record| {
                if !json {
                    print_record(record);
                }
            })
            .context("migration aborted")?;

        self.output.emit(&report)
    }

    fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            source_org: self.source_org.clone(),
            target_org: self.target_org.clone(),
            lock_source: self.lock_source.then_some(true),
            unlock_source: self.unlock_source.then_some(true),
            ..self.connection.layer()
        }
    }
}

impl ReportOutputArgs {
    /// Write the CSV file if requested, then print JSON or the summary.
    pub fn emit(&self, report: &MigrationReport) -> Result<()> {
        if let Some(path) = &self.csv {
            save_csv(path, report)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(report).context("failed to serialize report JSON")?
            );
            return Ok(());
        }

        print_summary(report);
        if let Some(path) = &self.csv {
            println!("Report written to {}", path.display());
        }
        Ok(())
    }
}

pub fn print_record(record: &MigrationRecord) {
    println!(
        "{}",
        format!("==> {}", record.workspace_name).blue().bold()
    );
    println!(
        "    {} → {}",
        record.source_workspace_id,
        record.target_id_label()
    );
    println!("    {}  {}", status_label(record.status), record.detail);
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "workspace")]
    workspace: String,
    #[tabled(rename = "source id")]
    source_id: String,
    #[tabled(rename = "target id")]
    target_id: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_summary(report: &MigrationReport) {
    let summary = report.summary();
    let elapsed = report
        .finished_at
        .map(|end| (end - report.started_at).num_milliseconds() as f64 / 1000.0)
        .unwrap_or_default();

    if report.all().is_empty() {
        println!("No workspaces in the source organization.");
        return;
    }

    let rows: Vec<SummaryRow> = report
        .all()
        .iter()
        .map(|r| SummaryRow {
            workspace: r.workspace_name.0.clone(),
            source_id: r.source_workspace_id.0.clone(),
            target_id: r.target_id_label().to_string(),
            status: status_label(r.status).to_string(),
            detail: r.detail.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    println!(
        "{} migrated | {} skipped | {} failed | {:.1}s",
        summary.migrated.to_string().green().bold(),
        summary.skipped.to_string().yellow().bold(),
        summary.failed.to_string().red().bold(),
        elapsed,
    );
}
