//! stateshift: move Terraform workspace state between organizations.
//!
//! # Usage
//!
//! ```text
//! stateshift migrate --source-org <org> --target-org <org> [--lock-source] [--unlock-source] [--csv <path>] [--json]
//! stateshift migrate-one --source-id <ws-id> --target-id <ws-id>
//! stateshift list <org> [--json]
//! stateshift lock <org>
//! stateshift unlock <org>
//! ```
//!
//! Connection settings come from `--base-url`/`--token`/`--timeout-secs`,
//! the `TFE_*` environment variables, or `~/.stateshift/config.yaml`.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    list::ListArgs, lock::ScopeLockArgs, migrate::MigrateArgs, migrate_one::MigrateOneArgs,
};
use stateshift_core::LockAction;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stateshift",
    version,
    about = "Migrate workspace state snapshots from one organization to another",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Migrate the current state of every same-named workspace.
    Migrate(MigrateArgs),

    /// Migrate one workspace pair addressed by id.
    MigrateOne(MigrateOneArgs),

    /// List the workspaces of an organization.
    List(ListArgs),

    /// Lock every workspace of an organization.
    Lock(ScopeLockArgs),

    /// Unlock every workspace of an organization.
    Unlock(ScopeLockArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Migrate(args) => args.run(),
        Commands::MigrateOne(args) => args.run(),
        Commands::List(args) => args.run(),
        Commands::Lock(args) => args.run(LockAction::Lock),
        Commands::Unlock(args) => args.run(LockAction::Unlock),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    // -v only raises our own crates; the HTTP stack stays at warn.
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let directives = ["stateshift", "stateshift_core", "stateshift_client", "stateshift_migrate"]
        .iter()
        .fold("warn".to_string(), |acc, krate| format!("{acc},{krate}={level}"));
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
