//! `stateshift lock` / `stateshift unlock`: apply a lock action to a whole
//! organization.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stateshift_core::{LockAction, OrgName};
use stateshift_migrate::{LockChange, LockCoordinator, WorkspaceDirectory};

use super::{connect, resolve, ConnectionArgs};

/// Arguments for `stateshift lock` and `stateshift unlock`.
#[derive(Args, Debug)]
pub struct ScopeLockArgs {
    /// Organization whose workspaces are (un)locked.
    pub org: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Tabled)]
struct LockRow {
    #[tabled(rename = "workspace")]
    workspace: String,
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "result")]
    result: String,
}

impl ScopeLockArgs {
    pub fn run(self, action: LockAction) -> Result<()> {
        let settings = resolve(self.connection.layer())?;
        let client = connect(&settings)?;
        let org = OrgName::from(self.org.as_str());

        let directory = WorkspaceDirectory::new(&client)
            .list(&org)
            .with_context(|| format!("cannot list workspaces of '{org}'"))?;
        let outcomes = LockCoordinator::new(&client).apply_to_directory(&directory, action);

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let rows: Vec<LockRow> = outcomes
            .into_iter()
            .map(|o| LockRow {
                workspace: o.workspace.name.0,
                id: o.workspace.id.0,
                result: match o.result {
                    Ok(LockChange::Applied) => format!("{action}ed").green().to_string(),
                    Ok(LockChange::AlreadyInState) => "unchanged".bright_black().to_string(),
                    Err(e) => e.to_string().red().to_string(),
                },
            })
            .collect();

        println!("{} | {} {} workspaces", org.to_string().bold(), action, rows.len());
        if !rows.is_empty() {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        if failed > 0 {
            println!("{} workspace(s) could not be {action}ed.", failed.to_string().red().bold());
        }
        Ok(())
    }
}
