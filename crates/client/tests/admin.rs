//! Admin panel gating and listing refreshes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod support;

use nutribase_client::{AdminError, AdminPanel, ApprovalAction, UserQuery};
use nutribase_core::Role;
use support::{Backend, email, user};

async fn panel_for(backend: &Backend, actor: &str, enable_db: bool) -> AdminPanel {
    let api = backend.start().await;
    let actor = api.get_user(&email(actor)).await.unwrap();
    AdminPanel::open(api, actor, UserQuery::NotApproved, enable_db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_plain_user_cannot_open_panel() {
    let api = Backend::seeded().start().await;
    let err = AdminPanel::open(
        api,
        user("alice@example.com", Role::User, true),
        UserQuery::All,
        false,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));
}

#[tokio::test]
async fn test_pending_admin_is_refused() {
    let backend = Backend::seeded();
    backend
        .state()
        .users
        .push(user("pending-admin@example.com", Role::Admin, false));
    let api = backend.start().await;
    let actor = api
        .get_user(&email("pending-admin@example.com"))
        .await
        .unwrap();

    let err = AdminPanel::open(api.clone(), actor.clone(), UserQuery::NotApproved, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));

    let mut panel = AdminPanel::new(api, actor, true);
    let err = panel
        .set_approval(&email("bob@example.com"), ApprovalAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));
    assert!(
        !backend
            .state()
            .users
            .iter()
            .any(|u| u.email.as_str() == "bob@example.com" && u.approved)
    );
}

#[tokio::test]
async fn test_gating_uses_current_target_role() {
    let backend = Backend::seeded();
    let mut panel = panel_for(&backend, "admin@example.com", false).await;
    let listed = panel.rows().unwrap()[0].clone();
    assert_eq!(listed.user.email.as_str(), "bob@example.com");
    assert!(listed.action_enabled);

    // promoted behind the panel's back
    for u in &mut backend.state().users {
        if u.email.as_str() == "bob@example.com" {
            u.role = Role::Admin;
        }
    }

    let err = panel
        .set_approval(&email("bob@example.com"), ApprovalAction::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Forbidden(_)));
    assert!(
        !backend
            .state()
            .requests
            .iter()
            .any(|r| r.ends_with("/approve"))
    );
}

#[tokio::test]
async fn test_queries_and_titles() {
    let backend = Backend::seeded();
    let mut panel = panel_for(&backend, "admin@example.com", false).await;

    assert_eq!(panel.title(), "1 Users Waiting Approval");
    panel.select_query(UserQuery::Approved).await.unwrap();
    assert_eq!(panel.title(), "4 Approved Users");
    panel.select_query(UserQuery::All).await.unwrap();
    assert_eq!(panel.title(), "5 Users");

    let rows = panel.rows().unwrap();
    let owner = rows.iter().find(|r| r.user.role == Role::Owner).unwrap();
    assert!(!owner.action_enabled);
    assert_eq!(owner.role, "OWNER");
    let alice = rows
        .iter()
        .find(|r| r.user.email.as_str() == "alice@example.com")
        .unwrap();
    assert!(alice.action_enabled);
    assert_eq!(alice.action, ApprovalAction::Revoke);
    assert!(rows.iter().all(|r| !r.deletable));
}

#[tokio::test]
async fn test_approval_refreshes_listing() {
    let backend = Backend::seeded();
    let mut panel = panel_for(&backend, "admin@example.com", false).await;

    panel.toggle_approval(&email("bob@example.com")).await.unwrap();
    assert_eq!(panel.title(), "0 Users Waiting Approval");
    assert!(backend.state().users.iter().all(|u| u.approved));

    panel.set_approval(&email("bob@example.com"), ApprovalAction::Revoke)
        .await
        .unwrap();
    assert_eq!(panel.title(), "1 Users Waiting Approval");
}

#[tokio::test]
async fn test_admin_cannot_touch_peers_or_owner() {
    let backend = Backend::seeded();
    let mut panel = panel_for(&backend, "admin@example.com", false).await;

    for target in ["other-admin@example.com", "owner@example.com", "admin@example.com"] {
        let err = panel
            .set_approval(&email(target), ApprovalAction::Revoke)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Forbidden(_)), "{target}");
    }
    assert!(
        !backend
            .state()
            .requests
            .iter()
            .any(|r| r.ends_with("/revoke"))
    );
}

#[tokio::test]
async fn test_unknown_target() {
    let backend = Backend::seeded();
    let mut panel = panel_for(&backend, "owner@example.com", false).await;
    let err = panel
        .toggle_approval(&email("ghost@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::UnknownUser(_)));
}

#[tokio::test]
async fn test_owner_only_operations() {
    let backend = Backend::seeded();
    let mut admin = panel_for(&backend, "admin@example.com", true).await;

    assert!(!admin.can_update_points());
    assert!(!admin.can_update_database());
    assert!(matches!(admin.update_points().await, Err(AdminError::Forbidden(_))));
    assert!(matches!(admin.update_database().await, Err(AdminError::Forbidden(_))));
    assert!(matches!(
        admin.delete_user(&email("bob@example.com")).await,
        Err(AdminError::Forbidden(_))
    ));

    let mut owner = panel_for(&backend, "owner@example.com", true).await;
    owner.update_points().await.unwrap();
    owner.update_database().await.unwrap();
    owner.delete_user(&email("bob@example.com")).await.unwrap();
    assert_eq!(owner.title(), "0 Users Waiting Approval");

    let state = backend.state();
    assert_eq!(state.points_updates, 1);
    assert_eq!(state.db_updates, 1);
    assert_eq!(state.users.len(), 4);
}

#[tokio::test]
async fn test_database_update_needs_switch() {
    let backend = Backend::seeded();
    let owner = panel_for(&backend, "owner@example.com", false).await;
    assert!(owner.can_update_points());
    assert!(!owner.can_update_database());
    assert!(matches!(owner.update_database().await, Err(AdminError::Forbidden(_))));
    assert_eq!(backend.state().db_updates, 0);
}
