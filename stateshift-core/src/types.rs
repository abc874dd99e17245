//! Domain types shared by the client, the migration engine and the CLI.
//!
//! Identifiers and names are newtypes so a workspace id can never be passed
//! where a workspace name is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of an organization (a scope of workspaces).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgName(pub String);

impl fmt::Display for OrgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrgName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a workspace. Unique within one organization; pairing across
/// organizations compares names exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceName(pub String);

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkspaceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkspaceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque control-plane identifier of a workspace (`ws-…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Desired lock state of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    /// Whether a workspace whose lock flag is `locked` already satisfies
    /// this action.
    pub fn is_satisfied_by(self, locked: bool) -> bool {
        match self {
            LockAction::Lock => locked,
            LockAction::Unlock => !locked,
        }
    }

    /// Path segment used by the control plane's `actions/<verb>` endpoints.
    pub fn verb(self) -> &'static str {
        match self {
            LockAction::Lock => "lock",
            LockAction::Unlock => "unlock",
        }
    }
}

impl fmt::Display for LockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Snapshot of one workspace as reported by a directory listing.
///
/// Immutable once built; the `locked` flag reflects the control plane at
/// query time only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDescriptor {
    pub name: WorkspaceName,
    pub id: WorkspaceId,
    pub locked: bool,
}

/// Pointer to a workspace's current state version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVersionPointer {
    /// Where the raw state document can be downloaded from.
    pub download_url: String,
}

/// The four attributes submitted when creating a state version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVersionPayload {
    pub serial: u64,
    /// Lowercase hex MD5 of the raw (undecoded) state bytes.
    pub md5: String,
    pub lineage: String,
    /// Standard base64 of the raw state bytes.
    pub state: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
