mod common;

use common::{Call, FakeControlPlane, Fault};
use stateshift_core::{LockAction, OrgName, WorkspaceDescriptor, WorkspaceName};
use stateshift_migrate::{LockChange, LockCoordinator, MigrationError, WorkspaceDirectory};

fn scope() -> FakeControlPlane {
    FakeControlPlane::new().with_org("acme", &[("api", "ws-1"), ("web", "ws-2"), ("db", "ws-3")])
}

fn descriptor(cp: &FakeControlPlane, name: &str) -> WorkspaceDescriptor {
    let dir = WorkspaceDirectory::new(cp).list(&OrgName::from("acme")).expect("list");
    dir[&WorkspaceName::from(name)].clone()
}

#[test]
fn dropped_guard_releases_the_lock_it_took() {
    let cp = scope();
    let api = descriptor(&cp, "api");
    let locks = LockCoordinator::new(&cp);

    let guard = locks.acquire(&api).expect("acquire");
    assert!(guard.acquired());
    assert!(cp.is_locked("ws-1"));
    drop(guard);

    assert!(!cp.is_locked("ws-1"));
    assert_eq!(
        cp.calls_for("ws-1"),
        [Call::Lock("ws-1".into()), Call::Unlock("ws-1".into())]
    );
}

#[test]
fn kept_guard_leaves_workspace_locked() {
    let cp = scope();
    let api = descriptor(&cp, "api");
    LockCoordinator::new(&cp).acquire(&api).expect("acquire").keep();
    assert!(cp.is_locked("ws-1"));
    assert_eq!(cp.calls_for("ws-1"), [Call::Lock("ws-1".into())]);
}

#[test]
fn guard_over_existing_lock_never_unlocks() {
    let cp = scope().with_locked("ws-1");
    let api = descriptor(&cp, "api");
    let guard = LockCoordinator::new(&cp).acquire(&api).expect("acquire");
    assert!(!guard.acquired());
    guard.release().expect("release");

    assert!(cp.is_locked("ws-1"));
    assert!(cp.calls_for("ws-1").is_empty());
}

#[test]
fn ensure_skips_call_when_state_matches() {
    let cp = scope();
    let api = descriptor(&cp, "api");
    let change = LockCoordinator::new(&cp)
        .ensure(&api, LockAction::Unlock)
        .expect("ensure");
    assert_eq!(change, LockChange::AlreadyInState);
    assert!(cp.calls_for("ws-1").is_empty());
}

#[test]
fn conflict_is_distinguished_from_other_lock_failures() {
    let cp = scope()
        .with_fault(Call::Lock("ws-1".into()), Fault::Status(409))
        .with_fault(Call::Lock("ws-2".into()), Fault::Status(500));
    let locks = LockCoordinator::new(&cp);

    let api = locks.set_lock(&"ws-1".into(), LockAction::Lock).unwrap_err();
    assert!(matches!(api, MigrationError::LockConflict { .. }));

    let web = locks.set_lock(&"ws-2".into(), LockAction::Lock).unwrap_err();
    assert!(matches!(
        web,
        MigrationError::LockFailed {
            action: LockAction::Lock,
            ..
        }
    ));
}

#[test]
fn scope_lock_skips_locked_and_continues_past_failures() {
    let cp = scope()
        .with_locked("ws-2")
        .with_fault(Call::Lock("ws-1".into()), Fault::Timeout);
    let dir = WorkspaceDirectory::new(&cp)
        .list(&OrgName::from("acme"))
        .expect("list");

    let outcomes = LockCoordinator::new(&cp).apply_to_directory(&dir, LockAction::Lock);
    let names: Vec<_> = outcomes.iter().map(|o| o.workspace.name.0.as_str()).collect();
    assert_eq!(names, ["api", "web", "db"]);

    assert!(matches!(
        outcomes[0].result,
        Err(MigrationError::TransportTimeout { .. })
    ));
    assert!(matches!(outcomes[1].result, Ok(LockChange::AlreadyInState)));
    assert!(matches!(outcomes[2].result, Ok(LockChange::Applied)));
    assert!(cp.is_locked("ws-3"));
    assert!(cp.calls_for("ws-2").is_empty());
}

#[test]
fn scope_unlock_only_touches_locked_workspaces() {
    let cp = scope().with_locked("ws-1").with_locked("ws-3");
    let dir = WorkspaceDirectory::new(&cp)
        .list(&OrgName::from("acme"))
        .expect("list");

    let outcomes = LockCoordinator::new(&cp).apply_to_directory(&dir, LockAction::Unlock);
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
    assert!(!cp.is_locked("ws-1"));
    assert!(!cp.is_locked("ws-3"));
    assert!(cp.calls_for("ws-2").is_empty());
}
