//! Error types for stateshift-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single control-plane call.
///
/// `operation` names the call (`"list workspaces"`, `"lock"`, …) so messages
/// stay readable once they end up in a report row.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Connection refused, DNS failure, TLS error, truncated body, …
    #[error("{operation}: transport error: {reason}")]
    Transport { operation: String, reason: String },

    /// The call did not complete within the configured timeout.
    #[error("{operation}: timed out")]
    Timeout { operation: String },

    /// The control plane answered with a non-success status.
    #[error("{operation}: HTTP {code}: {body}")]
    Status {
        operation: String,
        code: u16,
        body: String,
    },

    /// The response arrived but did not have the expected shape.
    #[error("{operation}: unexpected response: {reason}")]
    Decode { operation: String, reason: String },
}

impl ControlPlaneError {
    /// HTTP status code, when the control plane answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ControlPlaneError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ControlPlaneError::Timeout { .. })
    }
}

/// All errors that can arise while resolving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and serde_yaml context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A required value was not supplied by any layer.
    #[error("missing required setting `{key}` (pass a flag, set ${env}, or add it to the config file)")]
    Missing { key: &'static str, env: &'static str },

    /// A value was supplied but cannot be used.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}
