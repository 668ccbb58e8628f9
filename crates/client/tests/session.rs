//! End-to-end card editing sessions.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod support;

use std::time::Duration;

use nutribase_client::{SaveConfig, Session, SessionError, SessionOptions, SyncStatus};
use nutribase_core::policy::{self, AccessStatus};
use nutribase_core::{EditError, NutrientSelection};
use serde_json::{Value, json};
use support::{Backend, email};

fn options() -> SessionOptions {
    SessionOptions {
        undo_depth: 10,
        save: SaveConfig {
            retries: 1,
            backoff: Duration::from_millis(5),
        },
    }
}

fn card_names(body: &Value) -> Vec<String> {
    body["cardNutrients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap().to_owned())
        .collect()
}

fn names(session: &Session) -> Vec<String> {
    session
        .preferences()
        .unwrap()
        .card_nutrients
        .iter()
        .map(|n| n.name.clone())
        .collect()
}

#[tokio::test]
async fn test_open_unknown_user() {
    let api = Backend::seeded().start().await;
    let err = Session::open(api, email("ghost@example.com"), options())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::UserNotFound(e) if e.as_str() == "ghost@example.com"));
}

#[tokio::test]
async fn test_open_without_preferences_uses_defaults() {
    let backend = Backend::seeded();
    let session = Session::open(backend.start().await, email("alice@example.com"), options())
        .await
        .unwrap();

    assert_eq!(
        names(&session),
        ["kcal", "protein", "fat", "carbohydrate", "sugars", "fibre"]
    );
    assert!(!session.can_undo());
    assert!(!session.can_reset());
    assert_eq!(
        session.access_status(),
        AccessStatus::Approved(email("alice@example.com"))
    );

    assert_eq!(session.close().await, SyncStatus::Idle);
    assert!(backend.state().saves.is_empty());
}

#[tokio::test]
async fn test_pending_user_cannot_open_session() {
    let backend = Backend::seeded();
    let api = backend.start().await;

    let err = Session::open(api.clone(), email("bob@example.com"), options())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotApproved(e) if e.as_str() == "bob@example.com"));
    assert!(backend.state().saves.is_empty());

    // the navigation bar still knows who is waiting
    let bob = api.get_user(&email("bob@example.com")).await.unwrap();
    let status = policy::access_status(Some(&bob), false);
    assert_eq!(status, AccessStatus::AwaitingApproval);
    assert!(status.menus_enabled());
}

#[tokio::test]
async fn test_replace_undo_round_trip() {
    let backend = Backend::seeded();
    backend.state().preferences.insert(
        "alice@example.com".to_owned(),
        json!({
            "cardNutrients": [
                { "name": "kcal", "label": "Calories" },
                { "name": "protein", "label": "Protein" }
            ],
            "theme": "dark"
        }),
    );
    let mut session = Session::open(backend.start().await, email("alice@example.com"), options())
        .await
        .unwrap();

    let candidates = session.select("protein").unwrap();
    assert!(candidates.iter().any(|c| c.name == "fat"));
    assert!(!candidates.iter().any(|c| c.name == "kcal"));

    session.replace(NutrientSelection::new("fat", "Fat")).unwrap();
    assert_eq!(names(&session), ["kcal", "fat"]);
    assert!(session.can_undo());
    assert!(session.can_reset());

    let status = session.wait_for_sync().await;
    assert!(matches!(status, SyncStatus::Synced { .. }));
    {
        let state = backend.state();
        let stored = &state.preferences["alice@example.com"];
        assert_eq!(card_names(stored), ["kcal", "fat"]);
        assert_eq!(stored["theme"], "dark");
    }

    session.undo().unwrap();
    assert_eq!(names(&session), ["kcal", "protein"]);
    assert!(!session.can_undo());

    let status = session.close().await;
    assert!(matches!(status, SyncStatus::Synced { .. }));
    let state = backend.state();
    assert_eq!(
        card_names(&state.preferences["alice@example.com"]),
        ["kcal", "protein"]
    );
    assert_eq!(state.saves.len(), 2);
}

#[tokio::test]
async fn test_rejected_edits_change_nothing() {
    let backend = Backend::seeded();
    let mut session = Session::open(backend.start().await, email("alice@example.com"), options())
        .await
        .unwrap();

    let err = session.select("iron").unwrap_err();
    assert!(matches!(err, SessionError::Edit(EditError::UnknownNutrient(_))));

    session.select("fat").unwrap();
    let err = session
        .replace(NutrientSelection::new("kcal", "Calories"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Edit(EditError::DuplicateNutrient(_))));

    let err = session.replace_with("unobtainium").unwrap_err();
    assert!(matches!(err, SessionError::Edit(EditError::UnknownNutrient(_))));
    session.cancel();

    assert!(matches!(
        session.undo().unwrap_err(),
        SessionError::Edit(EditError::HistoryEmpty)
    ));
    assert!(matches!(
        session.reset().unwrap_err(),
        SessionError::Edit(EditError::AlreadyDefault)
    ));

    assert_eq!(session.close().await, SyncStatus::Idle);
    assert!(backend.state().saves.is_empty());
}

#[tokio::test]
async fn test_reset_then_undo() {
    let backend = Backend::seeded();
    backend.state().preferences.insert(
        "alice@example.com".to_owned(),
        json!({ "cardNutrients": [{ "name": "iron", "label": "Iron" }] }),
    );
    let mut session = Session::open(backend.start().await, email("alice@example.com"), options())
        .await
        .unwrap();

    session.reset().unwrap();
    assert_eq!(names(&session).len(), 6);
    session.undo().unwrap();
    assert_eq!(names(&session), ["iron"]);

    session.close().await;
    assert_eq!(
        card_names(&backend.state().preferences["alice@example.com"]),
        ["iron"]
    );
}

#[tokio::test]
async fn test_failed_save_then_reconcile() {
    let backend = Backend::seeded();
    let mut session = Session::open(backend.start().await, email("alice@example.com"), options())
        .await
        .unwrap();
    backend.state().fail_saves = 100;

    session.select("fibre").unwrap();
    session.replace_with("iron").unwrap();
    let status = session.wait_for_sync().await;
    assert!(status.is_failed());
    assert!(names(&session).contains(&"iron".to_owned()));

    session.reconcile().await.unwrap();
    assert!(!names(&session).contains(&"iron".to_owned()));
    assert!(!session.can_undo());
    assert!(matches!(session.sync_status(), SyncStatus::Synced { .. }));

    let status = session.close().await;
    assert!(!status.is_failed());
}
