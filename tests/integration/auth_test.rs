//! Integration tests for the login and logout flows.

use hrdesk_core::ErrorKind;
use hrdesk_entity::{AuthState, Role};
use hrdesk_session::LoginOutcome;
use hrdesk_store::CredentialStore;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_login_success_establishes_session() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    let outcome = controller.login("jdoe", "Secret123!", false).await.unwrap();

    let LoginOutcome::LoggedIn(identity) = outcome else {
        panic!("expected a logged-in outcome, got {outcome:?}");
    };
    assert_eq!(identity.username, "jdoe");
    assert_eq!(identity.role, Role::Employee);

    let state = controller.state().await;
    assert!(matches!(state, AuthState::Active { .. }));

    // The credential must be persisted under the username, carrying the
    // session id the server issued.
    let record = app.store.get("jdoe").await.unwrap().expect("stored record");
    assert_eq!(Some(record.session_id), app.server.active_session("jdoe"));
    assert_eq!(record.user.role, Role::Employee);
}

#[tokio::test]
async fn test_login_wrong_password_stays_signed_out() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    let err = controller.login("jdoe", "nope", false).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Session);
    assert!(matches!(controller.state().await, AuthState::SignedOut));
    assert!(app.store.get("jdoe").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_unknown_user_rejected() {
    let app = TestApp::new().await;

    let controller = app.controller();
    let err = controller.login("ghost", "whatever", false).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Session);
    assert!(matches!(controller.state().await, AuthState::SignedOut));
}

#[tokio::test]
async fn test_login_blank_input_never_reaches_the_server() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    let err = controller.login("jdoe", "", false).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    let calls = app.server.state.login_calls.load(std::sync::atomic::Ordering::SeqCst);
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn test_login_rejects_mismatched_claims() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);
    app.server.set_corrupt_identity(true);

    // The token's subject and the announced identity disagree; the
    // credential must be refused rather than silently cached.
    let controller = app.controller();
    let err = controller.login("jdoe", "Secret123!", false).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Session);
    assert!(matches!(controller.state().await, AuthState::SignedOut));
    assert!(app.store.get("jdoe-imposter").await.unwrap().is_none());
    assert!(app.store.get("jdoe").await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_clears_state_and_store() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    controller.login("jdoe", "Secret123!", false).await.unwrap();
    let mut events = controller.subscribe();

    controller.logout().await.unwrap();

    assert!(matches!(controller.state().await, AuthState::SignedOut));
    assert!(app.store.get("jdoe").await.unwrap().is_none());
    // The server no longer considers the session active.
    assert_eq!(app.server.active_session("jdoe"), None);

    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        hrdesk_core::events::SessionEvent::LoggedOut { username } if username == "jdoe"
    ));
}

#[tokio::test]
async fn test_relogin_after_logout_works() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    controller.login("jdoe", "Secret123!", false).await.unwrap();
    let first_session = app.server.active_session("jdoe").unwrap();
    controller.logout().await.unwrap();

    let outcome = controller.login("jdoe", "Secret123!", false).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::LoggedIn(_)));

    // Sessions are never reused across logins.
    let second_session = app.server.active_session("jdoe").unwrap();
    assert_ne!(first_session, second_session);
}

#[tokio::test]
async fn test_authenticated_request_flows_through() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    controller.login("jdoe", "Secret123!", false).await.unwrap();

    let value = controller.get("/echo").await.unwrap();
    assert_eq!(value["ok"], serde_json::json!(true));
    assert_eq!(value["username"], serde_json::json!("jdoe"));
}

#[tokio::test]
async fn test_cold_credential_adopted_from_store() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    // First "tab" signs in and goes away without logging out.
    let first = app.controller();
    first.login("jdoe", "Secret123!", false).await.unwrap();
    drop(first);

    // A fresh tab sharing the profile store picks the credential up
    // without a new login round trip.
    let second = app.controller();
    assert!(matches!(second.state().await, AuthState::SignedOut));
    let value = second.get("/echo").await.unwrap();
    assert_eq!(value["username"], serde_json::json!("jdoe"));
    assert_eq!(app.server.state.login_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}
