//! stateshift core library: domain types, the control-plane trait,
//! errors, and layered settings.
//!
//! - [`types`]: newtypes and domain structs
//! - [`client`]: [`ControlPlaneClient`]
//! - [`error`]: [`ControlPlaneError`], [`SettingsError`]
//! - [`settings`]: config file + flag/env layering

pub mod client;
pub mod error;
pub mod settings;
pub mod types;

pub use client::ControlPlaneClient;
pub use error::{ControlPlaneError, SettingsError};
pub use settings::{ConnectionSettings, MigrationOptions, SettingsLayer, Token};
pub use types::{
    LockAction, OrgName, StateVersionPayload, StateVersionPointer, WorkspaceDescriptor,
    WorkspaceId, WorkspaceName,
};
