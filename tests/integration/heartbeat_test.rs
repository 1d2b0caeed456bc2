//! Integration tests for the role-scoped heartbeat. The test app runs
//! with a 100ms heartbeat interval, so these tests use real time.

use std::time::Duration;

use hrdesk_core::events::{RevocationReason, SessionEvent};
use hrdesk_entity::{AuthState, Role};
use tokio::time::{sleep, timeout};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_employee_session_never_probes() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    controller.login("jdoe", "Secret123!", false).await.unwrap();
    sleep(Duration::from_millis(350)).await;

    assert_eq!(
        app.server.validate_calls(),
        0,
        "employee sessions are not single-session and must not be probed"
    );
}

#[tokio::test]
async fn test_privileged_session_probes_at_interval() {
    let app = TestApp::new().await;
    app.server.add_user("hr_manager", "Secret123!", Role::Hr);

    let controller = app.controller();
    controller.login("hr_manager", "Secret123!", false).await.unwrap();
    sleep(Duration::from_millis(350)).await;

    assert!(
        app.server.validate_calls() >= 2,
        "expected repeated probes, saw {}",
        app.server.validate_calls()
    );
}

#[tokio::test]
async fn test_heartbeat_stops_after_logout() {
    let app = TestApp::new().await;
    app.server.add_user("hr_manager", "Secret123!", Role::Hr);

    let controller = app.controller();
    controller.login("hr_manager", "Secret123!", false).await.unwrap();
    sleep(Duration::from_millis(250)).await;

    controller.logout().await.unwrap();

    // One probe may already be in flight; after that grace period the
    // counter must not move again.
    sleep(Duration::from_millis(150)).await;
    let settled = app.server.validate_calls();
    sleep(Duration::from_millis(300)).await;
    assert_eq!(app.server.validate_calls(), settled);
}

#[tokio::test]
async fn test_heartbeat_discovers_revocation() {
    let app = TestApp::new().await;
    app.server.add_user("hr_manager", "Secret123!", Role::Hr);

    let controller = app.controller();
    controller.login("hr_manager", "Secret123!", false).await.unwrap();
    let mut events = controller.subscribe();

    // Kill the session server-side without any foreground traffic; only
    // the background probe can notice.
    app.server.revoke_session(app.server.active_session("hr_manager").unwrap());

    let event = timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("revocation not discovered in time")
        .unwrap();
    assert!(
        matches!(
            event,
            SessionEvent::SessionRevoked { ref username, reason: RevocationReason::ServerSignal }
                if username == "hr_manager"
        ),
        "expected a server-signal revocation event, got {event:?}"
    );
    assert!(matches!(controller.state().await, AuthState::Revoked));
    assert!(app.server.validate_calls() >= 1);
}
