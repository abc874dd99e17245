//! Blocking HTTP implementation of [`ControlPlaneClient`] for the
//! Terraform Cloud / Enterprise v2 API.
//!
//! One `ureq::Agent` is shared by every call so connections are pooled and
//! the configured timeout applies uniformly. Nothing here retries.

use std::io::Read;

use serde::de::DeserializeOwned;

use stateshift_core::{
    ConnectionSettings, ControlPlaneClient, ControlPlaneError, LockAction, OrgName,
    StateVersionPayload, StateVersionPointer, Token, WorkspaceDescriptor, WorkspaceId,
};

use crate::wire::{Document, LockRequest, NewStateVersion, StateVersionResource, WorkspaceResource};

const JSON_API: &str = "application/vnd.api+json";
const LOCK_REASON: &str = "Locked by stateshift during state migration";
const PAGE_SIZE: &str = "100";
/// Longest response body quoted in an error message.
const BODY_EXCERPT: usize = 512;

/// Control-plane client speaking the TFE JSON:API over HTTPS.
#[derive(Debug)]
pub struct TfeClient {
    agent: ureq::Agent,
    base_url: String,
    token: Token,
}

impl TfeClient {
    pub fn new(settings: &ConnectionSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .user_agent(concat!("stateshift/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("Authorization", &format!("Bearer {}", self.token.expose()))
            .set("Content-Type", JSON_API)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: ureq::Request,
    ) -> Result<T, ControlPlaneError> {
        let response = self
            .authorized(request)
            .call()
            .map_err(|e| call_error(operation, e))?;
        read_json(operation, response)
    }

    fn post(&self, operation: &str, url: &str, body: &str) -> Result<(), ControlPlaneError> {
        tracing::debug!(operation, url = %url, "POST");
        self.authorized(self.agent.post(url))
            .send_string(body)
            .map_err(|e| call_error(operation, e))?;
        Ok(())
    }
}

impl ControlPlaneClient for TfeClient {
    fn list_workspaces(&self, org: &OrgName) -> Result<Vec<WorkspaceDescriptor>, ControlPlaneError> {
        const OP: &str = "list workspaces";
        let url = self.url(&format!("/organizations/{}/workspaces", org.0));
        tracing::debug!(%org, url = %url, "GET");
        let doc: Document<Vec<WorkspaceResource>> =
            self.get_json(OP, self.agent.get(&url).query("page[size]", PAGE_SIZE))?;
        Ok(doc.data.into_iter().map(Into::into).collect())
    }

    fn show_workspace(&self, id: &WorkspaceId) -> Result<WorkspaceDescriptor, ControlPlaneError> {
        let url = self.url(&format!("/workspaces/{}", id.0));
        tracing::debug!(%id, url = %url, "GET");
        let doc: Document<WorkspaceResource> = self.get_json("show workspace", self.agent.get(&url))?;
        Ok(doc.data.into())
    }

    fn current_state_version(
        &self,
        id: &WorkspaceId,
    ) -> Result<Option<StateVersionPointer>, ControlPlaneError> {
        const OP: &str = "current state version";
        let url = self.url(&format!("/workspaces/{}/current-state-version", id.0));
        tracing::debug!(%id, url = %url, "GET");
        let response = match self.authorized(self.agent.get(&url)).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(e) => return Err(call_error(OP, e)),
        };
        let doc: Document<StateVersionResource> = read_json(OP, response)?;
        Ok(Some(doc.data.into()))
    }

    fn download_state(&self, url: &str) -> Result<Vec<u8>, ControlPlaneError> {
        const OP: &str = "download state";
        tracing::debug!(url = %url, "GET");
        let response = self
            .authorized(self.agent.get(url))
            .call()
            .map_err(|e| call_error(OP, e))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| io_error(OP, &e))?;
        Ok(bytes)
    }

    fn create_state_version(
        &self,
        id: &WorkspaceId,
        payload: &StateVersionPayload,
    ) -> Result<(), ControlPlaneError> {
        const OP: &str = "create state version";
        let body = serde_json::to_string(&NewStateVersion::document(payload)).map_err(|e| {
            ControlPlaneError::Decode {
                operation: OP.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.post(OP, &self.url(&format!("/workspaces/{}/state-versions", id.0)), &body)
    }

    fn set_lock(&self, id: &WorkspaceId, action: LockAction) -> Result<(), ControlPlaneError> {
        let url = self.url(&format!("/workspaces/{}/actions/{}", id.0, action.verb()));
        let body = match action {
            LockAction::Lock => serde_json::to_string(&LockRequest {
                reason: LOCK_REASON,
            })
            .map_err(|e| ControlPlaneError::Decode {
                operation: action.verb().to_string(),
                reason: e.to_string(),
            })?,
            LockAction::Unlock => String::new(),
        };
        self.post(action.verb(), &url, &body)
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn read_json<T: DeserializeOwned>(
    operation: &str,
    response: ureq::Response,
) -> Result<T, ControlPlaneError> {
    let body = response
        .into_string()
        .map_err(|e| io_error(operation, &e))?;
    serde_json::from_str(&body).map_err(|e| ControlPlaneError::Decode {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

fn call_error(operation: &str, err: ureq::Error) -> ControlPlaneError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ControlPlaneError::Status {
                operation: operation.to_string(),
                code,
                body: excerpt(&body),
            }
        }
        ureq::Error::Transport(transport) => {
            let timed_out = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<std::io::Error>())
                .is_some_and(is_timeout)
                || transport.to_string().contains("timed out");
            if timed_out {
                ControlPlaneError::Timeout {
                    operation: operation.to_string(),
                }
            } else {
                ControlPlaneError::Transport {
                    operation: operation.to_string(),
                    reason: transport.to_string(),
                }
            }
        }
    }
}

fn io_error(operation: &str, err: &std::io::Error) -> ControlPlaneError {
    if is_timeout(err) {
        ControlPlaneError::Timeout {
            operation: operation.to_string(),
        }
    } else {
        ControlPlaneError::Transport {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_bodies() {
        assert_eq!(excerpt("  {\"errors\":[]}\n"), "{\"errors\":[]}");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), BODY_EXCERPT + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn io_timeouts_are_classified() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(io_error("download state", &err).is_timeout());

        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            io_error("download state", &err),
            ControlPlaneError::Transport { .. }
        ));
    }

    #[test]
    fn debug_output_does_not_leak_token() {
        let client = TfeClient::new(&ConnectionSettings {
            base_url: "https://tfe.example".into(),
            token: Token::new("very-secret"),
            timeout: std::time::Duration::from_secs(1),
        });
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("very-secret"), "got: {rendered}");
    }
}
