//! # stateshift-client
//!
//! HTTP implementation of [`stateshift_core::ControlPlaneClient`] for the
//! Terraform Cloud / Enterprise v2 API. Build one with [`TfeClient::new`]
//! from resolved [`stateshift_core::ConnectionSettings`].

pub mod tfe;
pub mod wire;

pub use tfe::TfeClient;
