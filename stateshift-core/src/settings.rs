//! Layered settings.
//!
//! # Precedence
//!
//! ```text
//! command-line flag  >  environment variable  >  ~/.stateshift/config.yaml  >  default
//! ```
//!
//! The CLI folds flags and environment variables into one [`SettingsLayer`]
//! (clap reads both); this module merges it over the file layer and
//! resolves the typed settings the client and the migration engine need.
//!
//! # API pattern
//!
//! As with every on-disk lookup in this workspace:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::types::OrgName;

pub const DEFAULT_BASE_URL: &str = "https://app.terraform.io/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "TFE_BASE_URL";
pub const ENV_TOKEN: &str = "TFE_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "TFE_TIMEOUT_SECS";
pub const ENV_SOURCE_ORG: &str = "SOURCE_ORG_NAME";
pub const ENV_TARGET_ORG: &str = "TARGET_ORG_NAME";

/// Org label used when a migration is addressed by workspace id.
pub const UNKNOWN_ORG: &str = "unknown";

// ---------------------------------------------------------------------------
// 1. Secret token
// ---------------------------------------------------------------------------

/// API token. `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for building the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

// ---------------------------------------------------------------------------
// 2. Layers
// ---------------------------------------------------------------------------

/// One layer of optional settings. Both the YAML file and the
/// flag/environment layer deserialize into this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_source: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_source: Option<bool>,
}

impl SettingsLayer {
    /// Fill every unset field of `self` from `lower`.
    pub fn over(self, lower: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            base_url: self.base_url.or(lower.base_url),
            token: self.token.or(lower.token),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            source_org: self.source_org.or(lower.source_org),
            target_org: self.target_org.or(lower.target_org),
            lock_source: self.lock_source.or(lower.lock_source),
            unlock_source: self.unlock_source.or(lower.unlock_source),
        }
    }

    /// Resolve what is needed to talk to the control plane.
    pub fn connection(&self) -> Result<ConnectionSettings, SettingsError> {
        let token = self
            .token
            .clone()
            .filter(|t| !t.expose().trim().is_empty())
            .ok_or(SettingsError::Missing {
                key: "token",
                env: ENV_TOKEN,
            })?;

        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(SettingsError::Invalid {
                key: "base_url",
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(ConnectionSettings {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Resolve the source/target pair and the source-lock behaviour flags.
    pub fn migration_options(&self) -> Result<MigrationOptions, SettingsError> {
        let source_org = required_org(self.source_org.as_deref(), "source_org", ENV_SOURCE_ORG)?;
        let target_org = required_org(self.target_org.as_deref(), "target_org", ENV_TARGET_ORG)?;
        if source_org == target_org {
            return Err(SettingsError::Invalid {
                key: "target_org",
                reason: format!("source and target organization are both '{source_org}'"),
            });
        }
        Ok(MigrationOptions {
            source_org,
            target_org,
            lock_source: self.lock_source.unwrap_or(false),
            unlock_source: self.unlock_source.unwrap_or(false),
        })
    }

    /// Options for a migration addressed by workspace id. The org names are
    /// only report labels there, so unset ones fall back to [`UNKNOWN_ORG`].
    pub fn labelled_options(&self) -> MigrationOptions {
        let label = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(OrgName::from)
                .unwrap_or_else(|| OrgName::from(UNKNOWN_ORG))
        };
        MigrationOptions {
            source_org: label(self.source_org.as_deref()),
            target_org: label(self.target_org.as_deref()),
            lock_source: self.lock_source.unwrap_or(false),
            unlock_source: self.unlock_source.unwrap_or(false),
        }
    }
}

fn required_org(
    value: Option<&str>,
    key: &'static str,
    env: &'static str,
) -> Result<OrgName, SettingsError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(OrgName::from(v)),
        _ => Err(SettingsError::Missing { key, env }),
    }
}

// ---------------------------------------------------------------------------
// 3. Resolved settings
// ---------------------------------------------------------------------------

/// Everything the HTTP client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// API root without a trailing slash.
    pub base_url: String,
    pub token: Token,
    pub timeout: Duration,
}

/// Behaviour of one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    pub source_org: OrgName,
    pub target_org: OrgName,
    /// Lock the source workspace before its state is fetched.
    pub lock_source: bool,
    /// Unlock the source workspace once its migration finishes.
    pub unlock_source: bool,
}

// ---------------------------------------------------------------------------
// 4. Config file
// ---------------------------------------------------------------------------

/// `<home>/.stateshift/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".stateshift").join("config.yaml")
}

/// Load the file layer. A missing file yields an empty layer.
pub fn load_file_at(home: &Path) -> Result<SettingsLayer, SettingsError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(SettingsLayer::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| SettingsError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(SettingsLayer::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| SettingsError::Parse { path, source })
}

/// `load_file_at` convenience wrapper.
pub fn load_file() -> Result<SettingsLayer, SettingsError> {
    load_file_at(&home()?)
}

fn home() -> Result<PathBuf, SettingsError> {
    dirs::home_dir().ok_or(SettingsError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
