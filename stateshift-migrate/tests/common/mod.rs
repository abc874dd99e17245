//! In-memory control plane shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use stateshift_core::{
    ControlPlaneClient, ControlPlaneError, LockAction, MigrationOptions, OrgName,
    StateVersionPayload, StateVersionPointer, WorkspaceDescriptor, WorkspaceId,
};

const STATE_URL_PREFIX: &str = "fake://state/";

/// One remote call, as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    List(String),
    Show(String),
    Current(String),
    Download(String),
    Publish(String),
    Lock(String),
    Unlock(String),
}

impl Call {
    pub fn workspace(&self) -> &str {
        match self {
            Call::List(s)
            | Call::Show(s)
            | Call::Current(s)
            | Call::Download(s)
            | Call::Publish(s)
            | Call::Lock(s)
            | Call::Unlock(s) => s,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Publish(_) | Call::Lock(_) | Call::Unlock(_))
    }
}

/// Failure to inject for a specific call.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Status(u16),
    Timeout,
    Decode,
}

#[derive(Default)]
struct State {
    /// Workspaces per org as `(name, id)`, in listing order.
    orgs: HashMap<String, Vec<(String, String)>>,
    states: HashMap<String, Vec<u8>>,
    locked: HashMap<String, bool>,
    published: Vec<(String, StateVersionPayload)>,
    calls: Vec<Call>,
    faults: HashMap<Call, Fault>,
}

#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an org with `(name, id)` workspaces, all unlocked.
    pub fn with_org(self, org: &str, workspaces: &[(&str, &str)]) -> Self {
        {
            let mut s = self.state.lock().unwrap();
            let entries = workspaces
                .iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect();
            for (_, id) in workspaces {
                s.locked.insert(id.to_string(), false);
            }
            s.orgs.insert(org.to_string(), entries);
        }
        self
    }

    pub fn with_state(self, id: &str, state: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .states
            .insert(id.to_string(), state.as_bytes().to_vec());
        self
    }

    pub fn with_locked(self, id: &str) -> Self {
        self.state.lock().unwrap().locked.insert(id.to_string(), true);
        self
    }

    pub fn with_fault(self, call: Call, fault: Fault) -> Self {
        self.state.lock().unwrap().faults.insert(call, fault);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, id: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.workspace() == id)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn published(&self) -> Vec<(String, StateVersionPayload)> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .locked
            .get(id)
            .copied()
            .unwrap_or(false)
    }

    /// Record `call` and return its injected fault, if any.
    fn enter(&self, call: Call, operation: &str) -> Result<(), ControlPlaneError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(call.clone());
        match s.faults.get(&call) {
            None => Ok(()),
            Some(Fault::Status(code)) => Err(ControlPlaneError::Status {
                operation: operation.to_string(),
                code: *code,
                body: format!("injected {code}"),
            }),
            Some(Fault::Timeout) => Err(ControlPlaneError::Timeout {
                operation: operation.to_string(),
            }),
            Some(Fault::Decode) => Err(ControlPlaneError::Decode {
                operation: operation.to_string(),
                reason: "injected decode failure".to_string(),
            }),
        }
    }

    fn descriptor(s: &State, name: &str, id: &str) -> WorkspaceDescriptor {
        WorkspaceDescriptor {
            name: name.into(),
            id: id.into(),
            locked: s.locked.get(id).copied().unwrap_or(false),
        }
    }
}

fn status(operation: &str, code: u16) -> ControlPlaneError {
    ControlPlaneError::Status {
        operation: operation.to_string(),
        code,
        body: String::new(),
    }
}

impl ControlPlaneClient for FakeControlPlane {
    fn list_workspaces(&self, org: &OrgName) -> Result<Vec<WorkspaceDescriptor>, ControlPlaneError> {
        self.enter(Call::List(org.0.clone()), "list workspaces")?;
        let s = self.state.lock().unwrap();
        let entries = s.orgs.get(&org.0).ok_or_else(|| status("list workspaces", 404))?;
        Ok(entries
            .iter()
            .map(|(name, id)| Self::descriptor(&s, name, id))
            .collect())
    }

    fn show_workspace(&self, id: &WorkspaceId) -> Result<WorkspaceDescriptor, ControlPlaneError> {
        self.enter(Call::Show(id.0.clone()), "show workspace")?;
        let s = self.state.lock().unwrap();
        s.orgs
            .values()
            .flatten()
            .find(|(_, ws_id)| *ws_id == id.0)
            .map(|(name, ws_id)| Self::descriptor(&s, name, ws_id))
            .ok_or_else(|| status("show workspace", 404))
    }

    fn current_state_version(
        &self,
        id: &WorkspaceId,
    ) -> Result<Option<StateVersionPointer>, ControlPlaneError> {
        self.enter(Call::Current(id.0.clone()), "current state version")?;
        let s = self.state.lock().unwrap();
        Ok(s.states.contains_key(&id.0).then(|| StateVersionPointer {
            download_url: format!("{STATE_URL_PREFIX}{}", id.0),
        }))
    }

    fn download_state(&self, url: &str) -> Result<Vec<u8>, ControlPlaneError> {
        let id = url.strip_prefix(STATE_URL_PREFIX).unwrap_or(url).to_string();
        self.enter(Call::Download(id.clone()), "download state")?;
        let s = self.state.lock().unwrap();
        s.states
            .get(&id)
            .cloned()
            .ok_or_else(|| status("download state", 404))
    }

    fn create_state_version(
        &self,
        id: &WorkspaceId,
        payload: &StateVersionPayload,
    ) -> Result<(), ControlPlaneError> {
        self.enter(Call::Publish(id.0.clone()), "create state version")?;
        self.state
            .lock()
            .unwrap()
            .published
            .push((id.0.clone(), payload.clone()));
        Ok(())
    }

    fn set_lock(&self, id: &WorkspaceId, action: LockAction) -> Result<(), ControlPlaneError> {
        let call = match action {
            LockAction::Lock => Call::Lock(id.0.clone()),
            LockAction::Unlock => Call::Unlock(id.0.clone()),
        };
        self.enter(call, action.verb())?;
        let mut s = self.state.lock().unwrap();
        let locked = s.locked.entry(id.0.clone()).or_insert(false);
        if action.is_satisfied_by(*locked) {
            return Err(status(action.verb(), 409));
        }
        *locked = action == LockAction::Lock;
        Ok(())
    }
}

pub fn options(source: &str, target: &str) -> MigrationOptions {
    MigrationOptions {
        source_org: source.into(),
        target_org: target.into(),
        lock_source: false,
        unlock_source: false,
    }
}

/// A minimal state document with the given bookkeeping.
pub fn state_doc(serial: u64, lineage: &str) -> String {
    format!(r#"{{"version":4,"serial":{serial},"lineage":"{lineage}","resources":[]}}"#)
}
