//! `stateshift list`: show the workspaces of an organization.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stateshift_core::OrgName;
use stateshift_migrate::WorkspaceDirectory;

use super::{connect, resolve, ConnectionArgs};

/// Arguments for `stateshift list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Organization to list.
    pub org: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Tabled)]
struct WorkspaceRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "locked")]
    locked: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let settings = resolve(self.connection.layer())?;
        let client = connect(&settings)?;
        let org = OrgName::from(self.org.as_str());

        let directory = WorkspaceDirectory::new(&client)
            .list(&org)
            .with_context(|| format!("cannot list workspaces of '{org}'"))?;

        if self.json {
            let workspaces: Vec<_> = directory.values().collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&workspaces)
                    .context("failed to serialize workspace JSON")?
            );
            return Ok(());
        }

        println!("{} | {} workspaces", org.to_string().bold(), directory.len());
        if directory.is_empty() {
            return Ok(());
        }
        let rows: Vec<WorkspaceRow> = directory
            .values()
            .map(|ws| WorkspaceRow {
                name: ws.name.0.clone(),
                id: ws.id.0.clone(),
                locked: if ws.locked {
                    "yes".yellow().to_string()
                } else {
                    "no".to_string()
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
