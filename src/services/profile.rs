// ABOUTME: User document lifecycle: creation after sign-up, login stamps, and typed partial updates
// ABOUTME: Profile edits are validated against the closed field set before they reach the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{load_user, missing, to_body};
use crate::errors::{AppResult, ErrorCode};
use crate::logging::AppLogger;
use crate::models::{ProfileFields, UserRecord};
use crate::store::{collections, timestamp, DocumentStore};

/// Result of a partial user update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedFields {
    /// Confirmation text
    pub message: String,
    /// Names of the fields that were written
    pub updated_fields: Vec<String>,
}

/// Reads and writes `users/{uid}` documents
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    logger: AppLogger,
}

impl ProfileService {
    /// Create the service
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, logger: AppLogger) -> Self {
        Self { store, logger }
    }

    /// Fetch a user document
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("User not found") if no document exists
    pub async fn get_user(&self, user_id: &str) -> AppResult<UserRecord> {
        load_user(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| missing("User not found"))
    }

    /// Create the document for a freshly registered account
    ///
    /// An existing document is returned unchanged, so client retries are harmless.
    ///
    /// # Errors
    ///
    /// Returns a database error if the store write fails
    #[instrument(skip(self, email, display_name), fields(user.id = %user_id))]
    pub async fn create_user(
        &self,
        user_id: &str,
        email: &str,
        display_name: Option<String>,
    ) -> AppResult<UserRecord> {
        if let Some(existing) = load_user(self.store.as_ref(), user_id).await? {
            debug!(parent: self.logger.span(), user.id = %user_id, "User document already exists");
            return Ok(existing);
        }

        let record = UserRecord::new(email, display_name);
        self.store
            .put(collections::USERS, user_id, to_body(&record)?)
            .await?;
        info!(parent: self.logger.span(), user.id = %user_id, "User document created");
        Ok(record)
    }

    /// Stamp `last_login`, creating the document if sign-up never created one
    ///
    /// # Errors
    ///
    /// Returns a database error if the store write fails
    pub async fn record_login(&self, user_id: &str, email: &str) -> AppResult<()> {
        if load_user(self.store.as_ref(), user_id).await?.is_some() {
            self.store
                .update(
                    collections::USERS,
                    user_id,
                    json!({ "last_login": timestamp::now() }),
                )
                .await?;
        } else {
            self.store
                .put(
                    collections::USERS,
                    user_id,
                    to_body(&UserRecord::new(email, None))?,
                )
                .await?;
        }
        self.logger.log_auth_event(user_id, "login", true);
        Ok(())
    }

    /// Apply a partial update from `POST /api/user/`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty body or unknown field, `UnknownCategory` for
    /// an unrecognized enumeration value, and `ResourceNotFound` if the user is missing
    pub async fn update_user(&self, user_id: &str, body: Value) -> AppResult<UpdatedFields> {
        let fields = ProfileFields::parse_update(body, "No update data provided")?;
        let updated_fields = self.apply(user_id, &fields, "User not found").await?;
        Ok(UpdatedFields {
            message: "User data updated successfully".to_owned(),
            updated_fields,
        })
    }

    /// Fetch the profile (the full user document)
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("Profile not found") if no document exists
    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserRecord> {
        load_user(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| missing("Profile not found"))
    }

    /// Apply a partial update from `PUT /api/user/profile`
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_user`], with "Profile not found" for a missing document
    pub async fn update_profile(&self, user_id: &str, body: Value) -> AppResult<Vec<String>> {
        let fields = ProfileFields::parse_update(body, "No data provided")?;
        self.apply(user_id, &fields, "Profile not found").await
    }

    async fn apply(
        &self,
        user_id: &str,
        fields: &ProfileFields,
        not_found: &str,
    ) -> AppResult<Vec<String>> {
        let partial = fields.to_partial()?;
        let names: Vec<String> = partial.keys().cloned().collect();

        self.store
            .update(collections::USERS, user_id, Value::Object(partial))
            .await
            .map_err(|e| {
                if e.code == ErrorCode::ResourceNotFound {
                    missing(not_found)
                } else {
                    e
                }
            })?;

        debug!(
            parent: self.logger.span(),
            user.id = %user_id,
            fields = ?names,
            "User document updated"
        );
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    fn service() -> ProfileService {
        let logger = AppLogger::new("profile-test");
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new(logger.clone()));
        ProfileService::new(store, logger)
    }

    #[tokio::test]
    async fn test_create_user_is_idempotent() {
        let service = service();
        let first = service
            .create_user("uid-1", "ana@example.com", Some("Ana".to_owned()))
            .await
            .unwrap();
        let second = service
            .create_user("uid-1", "other@example.com", None)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let err = service()
            .update_user("nobody", json!({"age": 30}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
        assert_eq!(err.message, "User not found");
    }

    #[tokio::test]
    async fn test_update_profile_reports_written_fields() {
        let service = service();
        service
            .create_user("uid-2", "bo@example.com", None)
            .await
            .unwrap();
        let mut fields = service
            .update_profile("uid-2", json!({"weight": 82, "goal": "lose weight"}))
            .await
            .unwrap();
        fields.sort();
        assert_eq!(fields, ["goal", "weight"]);

        let profile = service.get_profile("uid-2").await.unwrap();
        assert_eq!(profile.profile.weight, Some(82));
    }

    #[tokio::test]
    async fn test_record_login_creates_missing_document() {
        let service = service();
        service
            .record_login("uid-3", "cy@example.com")
            .await
            .unwrap();
        assert_eq!(service.get_user("uid-3").await.unwrap().email, "cy@example.com");
    }
}
