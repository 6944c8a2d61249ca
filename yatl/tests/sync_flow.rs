//! End-to-end behavior of the wired composition root

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedApi, task_json};
use serde_json::json;
use yatl::{App, Config, Credentials, KeyValueStorage, MemoryStorage, RecordingNavigator};

struct Harness {
    api: Arc<ScriptedApi>,
    storage: Arc<MemoryStorage>,
    navigator: Arc<RecordingNavigator>,
    app: Arc<App>,
}

fn harness() -> Harness {
    common::init_tracing();
    let api = Arc::new(ScriptedApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let app = App::with_parts(Config::default(), api.clone(), storage.clone(), navigator.clone());
    Harness {
        api,
        storage,
        navigator,
        app,
    }
}

async fn login(h: &Harness) {
    h.api.push_ok(serde_json::Value::Null); // csrf
    h.api.push_ok(json!({ "user": { "id": 1, "name": "Ada", "email": "ada@example.com" } }));
    let ok = h
        .app
        .auth
        .login(&Credentials {
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await;
    assert!(ok, "scripted login should succeed");
}

/// Poll until `check` passes or a deadline expires
async fn wait_for<F: Fn() -> bool>(check: F, what: &str) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn test_load_create_and_project() {
    let h = harness();

    h.api.push_ok(json!([task_json(1, "A", false, 1), task_json(2, "B", true, 2)]));
    h.app.tasks.load_tasks().await.unwrap();

    // state=["done"] projects task 2 only, canonical intact
    h.app
        .filters
        .set_filters(vec![yatl::Filter::new("state", vec!["done".to_string()])])
        .await;

    let visible = h.app.tasks.visible_tasks().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, 2);

    let canonical = h.app.tasks.tasks().await;
    assert_eq!(canonical.len(), 2);
    assert_eq!(canonical[0].order, 1);

    // Create a task through the store: POST then resync
    h.app.tasks.set_new_task_title("C").await;
    h.api.push_ok(task_json(3, "C", false, 3));
    h.api.push_ok(json!([
        task_json(1, "A", false, 1),
        task_json(2, "B", true, 2),
        task_json(3, "C", false, 3),
    ]));
    h.app.tasks.create_task().await;

    assert_eq!(h.app.tasks.tasks().await.len(), 3);
    assert_eq!(h.app.toasts.current().await, None);
}

#[tokio::test]
async fn test_filter_change_reloads_and_persists() {
    let h = harness();

    h.api.push_ok(json!([task_json(1, "A", false, 1), task_json(2, "B", true, 2)]));
    h.app
        .filters
        .add_or_update_filter("state", vec!["done".to_string()])
        .await;

    // The dispatcher reacts to the filter change with a canonical reload
    let mut reloaded = false;
    for _ in 0..200 {
        if h.app.tasks.tasks().await.len() == 2 {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(reloaded, "reload after filter change");

    assert_eq!(h.app.tasks.visible_tasks().await.len(), 1);
    assert!(h.app.filters.is_filter_applied().await);

    // Persisted under the guest scope while unauthenticated
    let stored = h.storage.get("filters_guest").await.expect("persisted filters");
    assert_eq!(stored[0]["filterValues"][0], "done");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_response_resets_session_and_navigates_once() {
    let h = harness();
    login(&h).await;
    assert!(h.app.auth.session().is_authenticated().await);

    // A 401 on a non-logout URL invalidates the session
    h.api.push_http_err(401, "http://localhost:8000/api/tasks");
    h.api.push_ok(serde_json::Value::Null); // the dispatcher's logout POST
    assert!(h.app.tasks.load_tasks().await.is_err());

    let navigator = h.navigator.clone();
    wait_for(|| !navigator.routes().is_empty(), "forced navigation").await;

    let state = h.app.auth.state().await;
    assert!(!state.is_authenticated);
    assert_eq!(state.user, None);
    assert!(h.app.tasks.tasks().await.is_empty());
    assert_eq!(h.navigator.routes(), vec!["/login".to_string()]);

    // A second 401 while already unauthenticated changes nothing
    h.api.push_http_err(401, "http://localhost:8000/api/tasks");
    assert!(h.app.tasks.load_tasks().await.is_err());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.navigator.routes().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_401_on_logout_url_does_not_loop() {
    let h = harness();
    login(&h).await;

    // Logout itself rejected with 401: no invalidation cascade
    h.api.push_http_err(401, "http://localhost:8000/api/logout");
    h.app.auth.logout().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(h.navigator.routes().is_empty());
    // The failed call surfaced as a mapped session error
    let state = h.app.auth.state().await;
    assert!(state.is_authenticated);
    assert_eq!(state.error.as_deref(), Some("Expired session. Please reconnect."));
}

#[tokio::test]
async fn test_start_restores_filters_and_list() {
    let h = harness();
    h.storage
        .set("filters_guest", json!([{ "filterName": "state", "filterValues": ["todo"] }]))
        .await;

    h.api.push_ok(serde_json::Value::Null); // csrf
    h.api.push_ok(json!({ "authenticated": false }));
    h.api.push_ok(json!([task_json(1, "A", false, 1), task_json(2, "B", true, 2)]));
    h.app.start().await;

    assert!(!h.app.auth.session().is_authenticated().await);
    assert_eq!(h.app.tasks.tasks().await.len(), 2);
    let visible = h.app.tasks.visible_tasks().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, 1);
}
