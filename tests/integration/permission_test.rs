//! Integration tests for role-based access checks against a signed-in
//! session.

use hrdesk_entity::Role;
use hrdesk_session::{AccessRequest, Permission};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_gates_follow_the_signed_in_role() {
    let app = TestApp::new().await;
    app.server.add_user("hr_manager", "Secret123!", Role::Hr);

    let controller = app.controller();
    controller.login("hr_manager", "Secret123!", false).await.unwrap();

    assert!(controller.can_access(&AccessRequest::roles(vec![Role::Hr, Role::Md])).await);
    assert!(!controller.can_access(&AccessRequest::roles(vec![Role::Admin])).await);
    assert!(!controller.can_access(&AccessRequest::roles(vec![Role::Employee])).await);
}

#[tokio::test]
async fn test_permission_checks_have_no_inheritance() {
    let app = TestApp::new().await;
    app.server.add_user("hr_manager", "Secret123!", Role::Hr);

    let controller = app.controller();
    controller.login("hr_manager", "Secret123!", false).await.unwrap();

    assert!(
        controller
            .can_access(&AccessRequest::permission(Permission::ApproveLeaveRequests))
            .await
    );
    // HR holds neither the admin band nor the employee self-service band.
    assert!(
        !controller
            .can_access(&AccessRequest::permission(Permission::SystemSettings))
            .await
    );
    assert!(
        !controller
            .can_access(&AccessRequest::permission(Permission::SubmitLeaveRequest))
            .await
    );
}

#[tokio::test]
async fn test_director_passes_every_band() {
    let app = TestApp::new().await;
    app.server.add_user("director", "Secret123!", Role::Md);

    let controller = app.controller();
    controller.login("director", "Secret123!", false).await.unwrap();

    for permission in [
        Permission::SubmitLeaveRequest,
        Permission::ApproveLeaveRequests,
        Permission::SystemSettings,
    ] {
        assert!(
            controller.can_access(&AccessRequest::permission(permission)).await,
            "director denied {permission:?}"
        );
    }
    assert_eq!(controller.gate().table().permissions_for_role(Role::Md).len(), 17);
}

#[tokio::test]
async fn test_signed_out_tab_is_denied() {
    let app = TestApp::new().await;
    app.server.add_user("jdoe", "Secret123!", Role::Employee);

    let controller = app.controller();
    assert!(!controller.can_access(&AccessRequest::new()).await);
    assert!(!controller.can_access(&AccessRequest::roles(vec![Role::Employee])).await);

    // Gates reopen with a session and close again after logout.
    controller.login("jdoe", "Secret123!", false).await.unwrap();
    assert!(controller.can_access(&AccessRequest::roles(vec![Role::Employee])).await);
    controller.logout().await.unwrap();
    assert!(!controller.can_access(&AccessRequest::roles(vec![Role::Employee])).await);
}
