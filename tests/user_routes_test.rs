// ABOUTME: Route tests for account creation, sign-in, user documents, profiles and chat
// ABOUTME: Drives the full router in-process with fake identity and language model providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors
#![allow(clippy::unwrap_used)]

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{test_app, token_for};
use glucowise_server::{
    llm::MessageRole,
    store::{collections, DocumentStore, Query},
};
use serde_json::json;

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = test_app();

    for (method, uri) in [
        (Method::GET, "/api/user"),
        (Method::GET, "/api/user/profile"),
        (Method::POST, "/api/user/chat"),
        (Method::GET, "/api/health/plan"),
        (Method::POST, "/api/health/diabetes_check"),
        (Method::GET, "/api/food/diet"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED", "{uri}");
    }
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/user/profile")
        .header("authorization", "Bearer forged")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_INVALID");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_unauthorized() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/user")
        .header("authorization", format!("Basic {}", token_for("alice")))
        .body(Body::empty())
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_create_user_then_fetch() {
    let app = test_app();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/createUser",
            Some("alice"),
            Some(json!({"email": "alice@clinic.org", "display_name": "Alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user_id"], "alice");

    let (status, user) = app.call(Method::GET, "/api/user", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "alice@clinic.org");
    assert_eq!(user["display_name"], "Alice");
    assert!(user["created_at"].as_str().unwrap().ends_with('Z'));

    // Trailing-slash form serves the same document
    let (status, again) = app.call(Method::GET, "/api/user/", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, user);
}

#[tokio::test]
async fn test_create_user_is_idempotent_and_falls_back_to_token_email() {
    let app = test_app();

    let (status, _) = app
        .call(Method::POST, "/api/user/createUser", Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/user/createUser",
            Some("bob"),
            Some(json!({"email": "other@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, user) = app.call(Method::GET, "/api/user", Some("bob"), None).await;
    assert_eq!(user["email"], "bob@example.com");
}

#[tokio::test]
async fn test_signup_and_login_issue_sessions() {
    let app = test_app();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/signup",
            None,
            Some(json!({"email": "carol@example.com", "password": "s3cret!"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], "carol");
    assert_eq!(body["id_token"], token_for("carol"));
    assert_eq!(body["expires_in"], 3600);

    let (_, before) = app.call(Method::GET, "/api/user", Some("carol"), None).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "carol@example.com", "password": "s3cret!"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let (_, after) = app.call(Method::GET, "/api/user", Some("carol"), None).await;
    assert_eq!(after["created_at"], before["created_at"]);
    assert!(after["last_login"].as_str().unwrap() >= before["last_login"].as_str().unwrap());
}

#[tokio::test]
async fn test_login_creates_missing_user_document() {
    let app = test_app();

    let (status, _) = app
        .call(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "dave@example.com", "password": "pw"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let doc = app.store.get(collections::USERS, "dave").await.unwrap();
    assert_eq!(doc.unwrap().body["email"], "dave@example.com");
}

#[tokio::test]
async fn test_credentials_are_required() {
    let app = test_app();

    for uri in ["/api/user/signup", "/api/user/login"] {
        let (status, body) = app
            .call(Method::POST, uri, None, Some(json!({"email": "x@example.com"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["message"], "Email and password are required");
    }

    let (status, _) = app
        .call(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "x@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/signup")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

// ============================================================================
// User Document and Profile
// ============================================================================

#[tokio::test]
async fn test_missing_user_and_profile_are_not_found() {
    let app = test_app();

    let (status, body) = app.call(Method::GET, "/api/user", Some("nobody"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "User not found");

    let (status, body) = app
        .call(Method::GET, "/api/user/profile", Some("nobody"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Profile not found");

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/user/profile",
            Some("nobody"),
            Some(json!({"age": 40})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Profile not found");
}

#[tokio::test]
async fn test_profile_update_merges_fields() {
    let app = test_app();
    app.seed_user("erin").await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/user/profile",
            Some("erin"),
            Some(json!({"weight": 82, "activity_level": "Very Active", "vegan": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile updated successfully");
    let mut fields: Vec<&str> = body["updated_fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    fields.sort_unstable();
    assert_eq!(fields, ["activity_level", "vegan", "weight"]);

    let (_, profile) = app
        .call(Method::GET, "/api/user/profile", Some("erin"), None)
        .await;
    assert_eq!(profile["weight"], 82);
    assert_eq!(profile["height"], 175);
    assert_eq!(profile["activity_level"], "Very Active");
    assert_eq!(profile["hypertension"], false);
    assert_eq!(profile["email"], "erin@example.com");
}

#[tokio::test]
async fn test_user_update_reports_fields() {
    let app = test_app();
    app.seed_user("fay").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/",
            Some("fay"),
            Some(json!({"goal": "lose weight"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User data updated successfully");
    assert_eq!(body["updated_fields"], json!(["goal"]));

    let (status, body) = app
        .call(Method::POST, "/api/user", Some("fay"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No update data provided");
}

#[tokio::test]
async fn test_profile_rejects_unknown_values() {
    let app = test_app();
    app.seed_user("gus").await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/user/profile",
            Some("gus"),
            Some(json!({"sex": "robot"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "sex");
    assert_eq!(body["error"]["details"]["value"], "robot");

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/user/profile",
            Some("gus"),
            Some(json!({"shoe_size": 44})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::PUT, "/api/user/profile", Some("gus"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No data provided");
}

#[tokio::test]
async fn test_fractional_weight_is_rejected_with_unit() {
    let app = test_app();
    app.seed_user("hal").await;

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/user/profile",
            Some("hal"),
            Some(json!({"weight": 70.5})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("whole number of kilograms"));

    let (_, profile) = app
        .call(Method::GET, "/api/user/profile", Some("hal"), None)
        .await;
    assert_eq!(profile["weight"], 70);
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_round_trip_and_history() {
    let app = test_app();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/chat",
            Some("hal"),
            Some(json!({"newMessage": "Is oatmeal good for breakfast?"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "echo: Is oatmeal good for breakfast?");
    assert_eq!(body["user_id"], "hal");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/user/chat",
            Some("hal"),
            Some(json!({"newMessage": "And for dinner?"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Second call carries the first turn as context
    let last = app.llm.requests().pop().unwrap();
    let roles: Vec<MessageRole> = last.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User
        ]
    );

    let (status, body) = app
        .call(Method::GET, "/api/user/chat/history", Some("hal"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .any(|turn| turn["message"] == "And for dinner?"));
}

#[tokio::test]
async fn test_chat_requires_message() {
    let app = test_app();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/user/chat",
            Some("ivy"),
            Some(json!({"newMessage": "   "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Message is required");
    assert!(app.llm.requests().is_empty());
}

#[tokio::test]
async fn test_delete_chat_history_only_touches_caller() {
    let app = test_app();
    for user in ["jan", "kim"] {
        app.call(
            Method::POST,
            "/api/user/chat",
            Some(user),
            Some(json!({"newMessage": "hello"})),
        )
        .await;
    }

    let (status, body) = app
        .call(Method::DELETE, "/api/user/chat/history", Some("jan"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Chat history deleted successfully");

    let (_, body) = app
        .call(Method::GET, "/api/user/chat/history", Some("jan"), None)
        .await;
    assert_eq!(body["history"], json!([]));

    let remaining = app
        .store
        .query(collections::CHAT_HISTORY, &Query::latest_for_user("kim", 10))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}
