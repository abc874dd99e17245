//! JSON:API documents exchanged with the control plane.
//!
//! Only the attributes stateshift reads are modelled; everything else in a
//! response is ignored. A missing modelled attribute is a decode error.

use serde::{Deserialize, Serialize};

use stateshift_core::{StateVersionPayload, StateVersionPointer, WorkspaceDescriptor};

/// Top-level `{"data": …}` envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceResource {
    pub id: String,
    pub attributes: WorkspaceAttributes,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: String,
    pub locked: bool,
}

impl From<WorkspaceResource> for WorkspaceDescriptor {
    fn from(resource: WorkspaceResource) -> Self {
        WorkspaceDescriptor {
            name: resource.attributes.name.into(),
            id: resource.id.into(),
            locked: resource.attributes.locked,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StateVersionResource {
    pub attributes: StateVersionAttributes,
}

#[derive(Debug, Deserialize)]
pub struct StateVersionAttributes {
    #[serde(rename = "hosted-state-download-url")]
    pub hosted_state_download_url: String,
}

impl From<StateVersionResource> for StateVersionPointer {
    fn from(resource: StateVersionResource) -> Self {
        StateVersionPointer {
            download_url: resource.attributes.hosted_state_download_url,
        }
    }
}

/// Request body for `POST /workspaces/{id}/state-versions`.
#[derive(Debug, Serialize)]
pub struct NewStateVersion<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: &'a StateVersionPayload,
}

impl<'a> NewStateVersion<'a> {
    pub fn document(payload: &'a StateVersionPayload) -> Document<Self> {
        Document {
            data: NewStateVersion {
                kind: "state-versions",
                attributes: payload,
            },
        }
    }
}

/// Request body for `POST /workspaces/{id}/actions/lock`.
#[derive(Debug, Serialize)]
pub struct LockRequest<'a> {
    pub reason: &'a str,
}
