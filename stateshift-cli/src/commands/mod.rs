pub mod list;
pub mod lock;
pub mod migrate;
pub mod migrate_one;

use anyhow::{Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};

use stateshift_client::TfeClient;
use stateshift_core::{settings, SettingsLayer, Token};
use stateshift_migrate::MigrationStatus;

/// Flags shared by every command that talks to the control plane.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// API root, e.g. https://app.terraform.io/api/v2.
    #[arg(long, env = "TFE_BASE_URL")]
    pub base_url: Option<String>,

    /// API token.
    #[arg(long, env = "TFE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "TFE_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    pub fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            base_url: self.base_url.clone(),
            token: self.token.clone().map(Token::new),
            timeout_secs: self.timeout_secs,
            ..SettingsLayer::default()
        }
    }
}

/// Merge the flag/env layer over the config file.
pub fn resolve(flags: SettingsLayer) -> Result<SettingsLayer> {
    let file = settings::load_file().context("failed to load ~/.stateshift/config.yaml")?;
    Ok(flags.over(file))
}

pub fn connect(settings: &SettingsLayer) -> Result<TfeClient> {
    let connection = settings
        .connection()
        .context("cannot connect to the control plane")?;
    tracing::debug!(base_url = %connection.base_url, timeout = ?connection.timeout, "connecting");
    Ok(TfeClient::new(&connection))
}

pub fn status_label(status: MigrationStatus) -> ColoredString {
    match status {
        MigrationStatus::Migrated => status.as_str().green().bold(),
        MigrationStatus::Skipped => status.as_str().yellow().bold(),
        MigrationStatus::Failed => status.as_str().red().bold(),
    }
}
