//! Integration tests for the REST surface, run against in-memory stores.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use kinnect_core::types::UserId;
use kinnect_entity::message::{MessageKind, NewMessage};
use kinnect_entity::store::MessageStore;

use common::TestApp;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_engine_stats_and_database_state() {
    let app = TestApp::new();

    let response = app.router.clone().oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "unreachable");
    assert_eq!(json["data"]["onlineUsers"], 0);
}

#[tokio::test]
async fn history_requires_a_bearer_token() {
    let app = TestApp::new();
    let (a, b) = (UserId::new(), UserId::new());

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/messages/{a}/{b}"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn history_is_visible_to_its_parties_only() {
    let app = TestApp::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");
    let carol = app.users.add_user("carol");

    for body in ["one", "two"] {
        app.messages
            .append(NewMessage {
                sender_id: alice,
                receiver_id: bob,
                body: body.to_string(),
                kind: MessageKind::Text,
                reply_to: None,
            })
            .await
            .unwrap();
    }

    let token = app.token_for(alice, "alice");
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/messages/{alice}/{bob}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let bodies: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(bodies, vec!["one", "two"]);

    // Either party order works.
    let token = app.token_for(bob, "bob");
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/messages/{bob}/{alice}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    // A third party is rejected.
    let token = app.token_for(carol, "carol");
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/messages/{alice}/{bob}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn presence_falls_back_to_the_persisted_last_seen() {
    let app = TestApp::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");
    let at = chrono::Utc::now() - chrono::Duration::hours(2);
    app.users.set_last_seen(bob, at);

    let token = app.token_for(alice, "alice");
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/users/{bob}/presence"), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["isOnline"], false);
    assert!(json["data"]["lastSeen"].is_string());
}

#[tokio::test]
async fn presence_is_also_served_on_the_legacy_status_path() {
    let app = TestApp::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let token = app.token_for(alice, "alice");
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/messages/{bob}/status"), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["isOnline"], false);
}

#[tokio::test]
async fn status_patch_advances_and_validates() {
    let app = TestApp::new();
    let alice = app.users.add_user("alice");
    let bob = app.users.add_user("bob");

    let message = app
        .messages
        .append(NewMessage {
            sender_id: alice,
            receiver_id: bob,
            body: "hi".to_string(),
            kind: MessageKind::Text,
            reply_to: None,
        })
        .await
        .unwrap();

    let token = app.token_for(bob, "bob");
    let patch = |id: String, status: &str, token: &str| {
        Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/messages/{id}/status"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"status":"{status}"}}"#)))
            .unwrap()
    };

    let response = app
        .router
        .clone()
        .oneshot(patch(message.id.to_string(), "delivered", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "delivered");

    // Regressing to sent is a validation error.
    let response = app
        .router
        .clone()
        .oneshot(patch(message.id.to_string(), "sent", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown ids are 404.
    let response = app
        .router
        .clone()
        .oneshot(patch(
            kinnect_core::types::MessageId::new().to_string(),
            "read",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ws_upgrade_rejects_a_bad_token() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/ws?token=not-a-jwt")
                .header(header::UPGRADE, "websocket")
                .header(header::CONNECTION, "upgrade")
                .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
                .header("sec-websocket-version", "13")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
