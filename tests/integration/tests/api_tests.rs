//! HTTP API tests against the in-process server
//!
//! Run with: cargo test -p integration-tests --test api_tests

use axum::body::Body;
use axum::http::{header, Request};
use dm_api::{create_app, AppState};
use integration_tests::{
    assert_error, assert_json, test_config, TestServer, TestWorld, ALICE, BOB, CAROL, GHOST,
};
use reqwest::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

async fn setup() -> (TestWorld, TestServer) {
    let world = TestWorld::new();
    let server = TestServer::start(&world).await.expect("Failed to start server");
    (world, server)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (_world, server) = setup().await;
    let response = server.get("/health").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_without_probes_is_ready() {
    let (_world, server) = setup().await;
    let response = server.get("/health/ready").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let (_world, server) = setup().await;
    let response = server.get("/api/v1/messages/conversations").await.unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "MISSING_AUTH");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (_world, server) = setup().await;
    let response = server
        .get_auth("/api/v1/messages/unread-count", "not-a-jwt")
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_from_other_issuer_is_rejected() {
    let (_world, server) = setup().await;
    let foreign = dm_common::JwtService::new("some-other-secret-entirely-different", 900);
    let token = foreign.generate_access_token(ALICE).unwrap();

    let response = server
        .get_auth("/api/v1/messages/conversations", &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "INVALID_TOKEN");
}

// ============================================================================
// Send
// ============================================================================

#[tokio::test]
async fn test_send_message_creates_conversation() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server.send(&token, BOB, "hello").await.unwrap();
    let body: Value = assert_json(response, StatusCode::CREATED).await.unwrap();

    assert_eq!(body["message"]["content"], "hello");
    assert_eq!(body["message"]["senderId"], ALICE.to_string());
    assert_eq!(body["message"]["recipientId"], BOB.to_string());
    assert_eq!(body["message"]["read"], false);
    assert_eq!(body["conversation"]["participantsKey"], "1001_1002");
    assert_eq!(body["conversation"]["lastMessageId"], body["message"]["id"]);
    assert_eq!(world.store.conversation_count(), 1);
}

#[tokio::test]
async fn test_send_accepts_numeric_recipient() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server
        .post_auth(
            "/api/v1/messages/send",
            &token,
            &serde_json::json!({ "to": 1002, "message": "numeric id" }),
        )
        .await
        .unwrap();
    assert_json::<Value>(response, StatusCode::CREATED).await.unwrap();
}

#[tokio::test]
async fn test_send_to_self_is_rejected() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server.send(&token, ALICE, "me, myself").await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "SELF_MESSAGE");
}

#[tokio::test]
async fn test_send_to_unknown_user_is_not_found() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server.send(&token, GHOST, "hello?").await.unwrap();
    let code = assert_error(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(code, "UNKNOWN_USER");
}

#[tokio::test]
async fn test_send_content_bounds() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server.send(&token, BOB, "").await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "VALIDATION_ERROR");

    let response = server.send(&token, BOB, "   ").await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "EMPTY_CONTENT");

    let response = server.send(&token, BOB, " \t\n").await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "EMPTY_CONTENT");

    let response = server.send(&token, BOB, "  padded  ").await.unwrap();
    let sent: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(sent["message"]["content"], "  padded  ");

    let response = server.send(&token, BOB, &"x".repeat(1000)).await.unwrap();
    assert_json::<Value>(response, StatusCode::CREATED).await.unwrap();

    let response = server.send(&token, BOB, &"x".repeat(1001)).await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_send_malformed_body_is_bad_request() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server
        .post_auth(
            "/api/v1/messages/send",
            &token,
            &serde_json::json!({ "to": "bob", "message": "hi" }),
        )
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_BODY");
}

#[tokio::test]
async fn test_store_outage_is_generic_server_error() {
    let (world, server) = setup().await;
    world.store.fail_appends(true);
    let token = world.token(ALICE);

    let response = server.send(&token, BOB, "hello").await.unwrap();
    let body: Value = assert_json(response, StatusCode::INTERNAL_SERVER_ERROR)
        .await
        .unwrap();
    assert_eq!(body["error"]["message"], "Internal server error");
    assert!(!body.to_string().contains("connection refused"));
}

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_conversation_lifecycle() {
    let (world, server) = setup().await;
    let alice = world.token(ALICE);
    let bob = world.token(BOB);

    let sent: Value = assert_json(
        server.send(&alice, BOB, "hello").await.unwrap(),
        StatusCode::CREATED,
    )
    .await
    .unwrap();
    assert_json::<Value>(
        server.send(&alice, BOB, "how are you").await.unwrap(),
        StatusCode::CREATED,
    )
    .await
    .unwrap();
    let conversation_id = sent["conversation"]["id"].as_str().unwrap().to_string();

    // Bob's badge and inbox before reading
    let unread: Value = assert_json(
        server.get_auth("/api/v1/messages/unread-count", &bob).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(unread["unreadCount"], 2);

    let inbox: Value = assert_json(
        server.get_auth("/api/v1/messages/conversations", &bob).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(inbox[0]["conversationId"], conversation_id);
    assert_eq!(inbox[0]["otherUser"]["name"], "Alice Seeker");
    assert_eq!(inbox[0]["otherUser"]["role"], "seeker");
    assert_eq!(inbox[0]["unreadCount"], 2);
    assert_eq!(inbox[0]["isFromCurrentUser"], false);
    assert_eq!(inbox[0]["lastMessage"]["content"], "how are you");

    // Opening the thread reads it
    let page: Value = assert_json(
        server
            .get_auth(&format!("/api/v1/messages/conversations/{conversation_id}"), &bob)
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(page["conversationId"], conversation_id);
    let messages = page["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[1]["content"], "how are you");
    assert!(messages.iter().all(|m| m["read"] == true));

    let unread: Value = assert_json(
        server.get_auth("/api/v1/messages/unread-count", &bob).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(unread["unreadCount"], 0);

    // Explicit read after viewing changes nothing
    let marked: Value = assert_json(
        server
            .post_empty_auth(
                &format!("/api/v1/messages/conversations/{conversation_id}/read"),
                &bob,
            )
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(marked["conversationId"], conversation_id);
    assert_eq!(marked["updated"], 0);
}

#[tokio::test]
async fn test_outsider_gets_forbidden() {
    let (world, server) = setup().await;
    let sent: Value = assert_json(
        server.send(&world.token(ALICE), BOB, "secret").await.unwrap(),
        StatusCode::CREATED,
    )
    .await
    .unwrap();
    let conversation_id = sent["conversation"]["id"].as_str().unwrap().to_string();
    let carol = world.token(CAROL);

    let response = server
        .get_auth(&format!("/api/v1/messages/conversations/{conversation_id}"), &carol)
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::FORBIDDEN).await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_PARTICIPANT");
    assert!(!body.to_string().contains("secret"));

    let response = server
        .post_empty_auth(
            &format!("/api/v1/messages/conversations/{conversation_id}/read"),
            &carol,
        )
        .await
        .unwrap();
    assert_error(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let (world, server) = setup().await;
    let response = server
        .get_auth("/api/v1/messages/conversations/123456", &world.token(ALICE))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(code, "UNKNOWN_CONVERSATION");
}

#[tokio::test]
async fn test_malformed_path_and_query() {
    let (world, server) = setup().await;
    let token = world.token(ALICE);

    let response = server
        .get_auth("/api/v1/messages/conversations/not-an-id", &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_PATH");

    let response = server
        .get_auth("/api/v1/messages/conversation/abc", &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_PATH");

    let response = server
        .get_auth("/api/v1/messages/conversation/1002?limit=lots", &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_QUERY");

    let response = server
        .get_auth("/api/v1/messages/conversation/1002?before=yesterday", &token)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_QUERY");
}

#[tokio::test]
async fn test_messages_with_user_and_pagination() {
    let (world, server) = setup().await;
    let bob = world.token(BOB);

    let empty: Value = assert_json(
        server
            .get_auth(&format!("/api/v1/messages/conversation/{ALICE}"), &bob)
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert!(empty["conversationId"].is_null());
    assert_eq!(empty["messages"].as_array().unwrap().len(), 0);

    let mut ids = Vec::new();
    for i in 0..5 {
        let sent: Value = assert_json(
            server.send(&bob, ALICE, &format!("m{i}")).await.unwrap(),
            StatusCode::CREATED,
        )
        .await
        .unwrap();
        ids.push(sent["message"]["id"].as_str().unwrap().to_string());
    }

    let latest: Value = assert_json(
        server
            .get_auth(&format!("/api/v1/messages/conversation/{ALICE}?limit=2"), &bob)
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    let contents: Vec<&str> = latest["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["content"].as_str())
        .collect();
    assert_eq!(contents, ["m3", "m4"]);

    let older: Value = assert_json(
        server
            .get_auth(
                &format!("/api/v1/messages/conversation/{ALICE}?limit=2&before={}", ids[3]),
                &bob,
            )
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    let contents: Vec<&str> = older["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["content"].as_str())
        .collect();
    assert_eq!(contents, ["m1", "m2"]);

    // Bob only viewed his own messages; Alice's badge is untouched
    let unread: Value = assert_json(
        server
            .get_auth("/api/v1/messages/unread-count", &world.token(ALICE))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(unread["unreadCount"], 5);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let world = TestWorld::new();
    let app = create_app(AppState::new(world.context.clone(), test_config()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/messages/unread-count")
                .header("x-request-id", "req-123")
                .header(header::AUTHORIZATION, format!("Bearer {}", world.token(ALICE)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
}

#[tokio::test]
async fn test_rate_limit_rejects_burst_overflow() {
    let world = TestWorld::new();
    let mut config = test_config();
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst = 2;
    let server = TestServer::start_with_config(&world, config).await.unwrap();
    let token = world.token(ALICE);

    let mut statuses = Vec::new();
    for _ in 0..5 {
        let response = server
            .get_auth("/api/v1/messages/unread-count", &token)
            .await
            .unwrap();
        statuses.push(response.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Health stays outside the limiter
    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
