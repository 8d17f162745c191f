// ABOUTME: Domain service layer behind the HTTP routes
// ABOUTME: Each service owns its store handle, external clients, and injected logger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Domain service layer
//!
//! Route handlers authenticate, parse the request and delegate here. Services read and
//! write documents through [`DocumentStore`], call the hosted model and vision APIs
//! through their traits, and return typed records.

/// Chat with the assistant and chat history
pub mod chat;

/// Recipe generation from photos and macro lookups
pub mod food;

/// Metrics, diabetes risk, diet plans and advice
pub mod health;

/// User documents and profile updates
pub mod profile;

pub use chat::{ChatHistoryEntry, ChatService};
pub use food::{DietHistoryEntry, FoodService};
pub use health::HealthService;
pub use profile::{ProfileService, UpdatedFields};

use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::UserRecord;
use crate::store::{collections, DocumentStore, Query};

/// 404 with a fixed message
fn missing(message: &str) -> AppError {
    AppError::new(ErrorCode::ResourceNotFound, message)
}

/// Load and decode the `users/{uid}` document
async fn load_user(store: &dyn DocumentStore, user_id: &str) -> AppResult<Option<UserRecord>> {
    store
        .get(collections::USERS, user_id)
        .await?
        .map(|doc| doc.decode::<UserRecord>())
        .transpose()
}

/// Newest `limit` records a user owns in `collection`, newest first
async fn recent_records<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    user_id: &str,
    limit: usize,
) -> AppResult<Vec<(String, T)>> {
    store
        .query(collection, &Query::latest_for_user(user_id, limit))
        .await?
        .into_iter()
        .map(|doc| {
            let id = doc.id.clone();
            doc.decode::<T>().map(|record| (id, record))
        })
        .collect()
}

/// The single newest record a user owns in `collection`
async fn latest_record<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    user_id: &str,
) -> AppResult<Option<(String, T)>> {
    Ok(recent_records(store, collection, user_id, 1)
        .await?
        .into_iter()
        .next())
}

/// Serialize a record for the store
fn to_body<T: serde::Serialize>(record: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(record).map_err(AppError::from)
}
