// ABOUTME: Behavioural tests shared by the SQLite and in-memory document stores
// ABOUTME: Covers put/get, shallow-merge updates, filtered newest-first queries, and bulk delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors
#![allow(clippy::unwrap_used)]

mod common;

use glucowise_server::{
    config::DatabaseUrl,
    errors::ErrorCode,
    logging::AppLogger,
    store::{
        collections, timestamp, DocumentStore, MemoryDocumentStore, Query, SortDirection,
        SqliteDocumentStore,
    },
};
use serde_json::{json, Value};

async fn sqlite_store(dir: &tempfile::TempDir) -> SqliteDocumentStore {
    let url = DatabaseUrl::SQLite {
        path: dir.path().join("nested").join("glucowise.db"),
    };
    SqliteDocumentStore::connect(&url, AppLogger::new("store_test"))
        .await
        .unwrap()
}

fn memory_store() -> MemoryDocumentStore {
    MemoryDocumentStore::new(AppLogger::new("store_test"))
}

/// Seconds-since-epoch offsets rendered the way services stamp records
fn stamp(seconds: i64) -> String {
    let base = chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    timestamp::format(&(base + chrono::Duration::seconds(seconds)))
}

async fn check_put_get_update(store: &dyn DocumentStore) {
    assert!(store.get(collections::USERS, "u1").await.unwrap().is_none());

    store
        .put(
            collections::USERS,
            "u1",
            json!({"email": "a@example.com", "age": 30, "goal": "maintain"}),
        )
        .await
        .unwrap();

    store
        .update(collections::USERS, "u1", json!({"age": 31, "vegan": true}))
        .await
        .unwrap();

    let doc = store.get(collections::USERS, "u1").await.unwrap().unwrap();
    assert_eq!(doc.id, "u1");
    assert_eq!(
        doc.body,
        json!({"email": "a@example.com", "age": 31, "goal": "maintain", "vegan": true})
    );

    let err = store
        .update(collections::USERS, "ghost", json!({"age": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = store
        .put(collections::USERS, "u2", json!(["not", "an", "object"]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

async fn check_newest_first_with_limit(store: &dyn DocumentStore) {
    for (offset, user) in [(10, "u1"), (30, "u1"), (20, "u1"), (40, "u2"), (5, "u1")] {
        store
            .add(
                collections::CHAT_HISTORY,
                json!({"user_id": user, "message": format!("m{offset}"), "timestamp": stamp(offset)}),
            )
            .await
            .unwrap();
    }

    let docs = store
        .query(
            collections::CHAT_HISTORY,
            &Query::latest_for_user("u1", 3),
        )
        .await
        .unwrap();
    let messages: Vec<&str> = docs
        .iter()
        .map(|d| d.body["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, ["m30", "m20", "m10"]);

    let ascending = store
        .query(
            collections::CHAT_HISTORY,
            &Query::new()
                .filter_eq("user_id", "u1")
                .order_by("timestamp", SortDirection::Ascending),
        )
        .await
        .unwrap();
    assert_eq!(ascending.len(), 4);
    assert_eq!(ascending[0].body["message"], "m5");

    let other = store
        .query(collections::CHAT_HISTORY, &Query::latest_for_user("u3", 10))
        .await
        .unwrap();
    assert!(other.is_empty());
}

async fn check_delete_where(store: &dyn DocumentStore) {
    for user in ["u1", "u1", "u2"] {
        store
            .add(
                collections::DIET_QUERIES,
                json!({"user_id": user, "food_item": "apple", "timestamp": stamp(0)}),
            )
            .await
            .unwrap();
    }

    let deleted = store
        .delete_where(collections::DIET_QUERIES, "user_id", &json!("u1"))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let remaining = store
        .query(collections::DIET_QUERIES, &Query::new())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].body["user_id"], "u2");
}

async fn check_rejects_unsafe_fields(store: &dyn DocumentStore) {
    let err = store
        .query(
            collections::PLANS,
            &Query::new().filter_eq("user_id') OR 1=1 --", "x"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = store
        .query(
            collections::PLANS,
            &Query::new().filter_eq("user_id", Value::Array(vec![])),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_memory_store_behaviour() {
    common::init_test_logging();
    let store = memory_store();
    check_put_get_update(&store).await;
    check_newest_first_with_limit(&store).await;
    check_delete_where(&store).await;
    check_rejects_unsafe_fields(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_behaviour() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;
    check_put_get_update(&store).await;
    check_newest_first_with_limit(&store).await;
    check_delete_where(&store).await;
    check_rejects_unsafe_fields(&store).await;
}

#[tokio::test]
async fn test_sqlite_documents_survive_reopen() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();

    {
        let store = sqlite_store(&dir).await;
        store
            .put(collections::USERS, "persisted", json!({"email": "p@example.com"}))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let reopened = sqlite_store(&dir).await;
    let doc = reopened
        .get(collections::USERS, "persisted")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.body["email"], "p@example.com");
}

#[tokio::test]
async fn test_generated_ids_are_unique() {
    let store = memory_store();
    let a = store
        .add(collections::ADVICE, json!({"user_id": "u"}))
        .await
        .unwrap();
    let b = store
        .add(collections::ADVICE, json!({"user_id": "u"}))
        .await
        .unwrap();
    assert_ne!(a, b);
}
