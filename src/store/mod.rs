// ABOUTME: Document store abstraction: keyed JSON documents grouped into named collections
// ABOUTME: Filtering, ordering and limits are executed by the backend, never fetched-then-sorted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Document Store
//!
//! Every persisted record is a JSON object stored under `(collection, id)`.
//! Backends implement [`DocumentStore`]:
//!
//! - [`SqliteDocumentStore`]: one `documents` table, `json_extract` filters and ordering
//! - [`MemoryDocumentStore`]: process-local maps, for tests and ephemeral runs
//!
//! "Latest" and "history" reads always go through [`Query`] with an explicit
//! `order_by` and `limit` so the backend does the sorting.

/// In-memory backend
pub mod memory;
/// `SQLite` backend
pub mod sqlite;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DatabaseUrl;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Collection names shared by services and tests
pub mod collections {
    /// User documents keyed by provider user ID
    pub const USERS: &str = "users";
    /// Generated diet plans
    pub const PLANS: &str = "plans";
    /// Generated health advice
    pub const ADVICE: &str = "advice";
    /// Diabetes risk assessments
    pub const DIABETES_CHECKS: &str = "diabetes_checks";
    /// Recipes generated from food photos
    pub const RECIPE_QUERIES: &str = "recipe_queries";
    /// Macro breakdown lookups
    pub const DIET_QUERIES: &str = "diet_queries";
    /// Chat turns
    pub const CHAT_HISTORY: &str = "chat_history";
}

/// A stored JSON document with its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document key, unique within its collection
    pub id: String,
    /// JSON object body
    pub body: Value,
}

impl Document {
    /// Deserialize the body into a typed record
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the body does not match `T`
    pub fn decode<T: for<'de> Deserialize<'de>>(self) -> AppResult<T> {
        serde_json::from_value(self.body).map_err(|e| {
            AppError::serialization(format!("Failed to decode document {}: {e}", self.id))
        })
    }
}

/// Sort direction for ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest (newest) first
    Descending,
}

impl SortDirection {
    /// SQL keyword
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Equality filter, ordering and limit for a collection scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Top-level field that must equal the value
    pub filter: Option<(String, Value)>,
    /// Field to order by
    pub order_by: Option<(String, SortDirection)>,
    /// Maximum number of documents returned
    pub limit: Option<usize>,
}

impl Query {
    /// Match every document in the collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match documents whose `field` equals `value`
    #[must_use]
    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter = Some((field.to_owned(), value.into()));
        self
    }

    /// Order results by `field`
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some((field.to_owned(), direction));
        self
    }

    /// Return at most `limit` documents
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Shorthand for the newest `limit` documents owned by a user
    #[must_use]
    pub fn latest_for_user(user_id: &str, limit: usize) -> Self {
        Self::new()
            .filter_eq("user_id", user_id)
            .order_by("timestamp", SortDirection::Descending)
            .limit(limit)
    }

    /// Reject field names that are not plain identifiers
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unsafe field name or a non-scalar filter value
    pub fn validate(&self) -> AppResult<()> {
        if let Some((field, value)) = &self.filter {
            validate_field(field)?;
            if value.is_array() || value.is_object() {
                return Err(AppError::invalid_input(format!(
                    "Filter on '{field}' must compare against a scalar value"
                )));
            }
        }
        if let Some((field, _)) = &self.order_by {
            validate_field(field)?;
        }
        Ok(())
    }
}

/// Async document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    ///
    /// # Errors
    ///
    /// Returns a database error if the backend fails
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Create or replace a document
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `body` is not an object, or a database error
    async fn put(&self, collection: &str, id: &str, body: Value) -> AppResult<()>;

    /// Shallow-merge `partial` into an existing document
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the document does not exist
    async fn update(&self, collection: &str, id: &str, partial: Value) -> AppResult<()>;

    /// Insert a document under a generated key and return the key
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `body` is not an object, or a database error
    async fn add(&self, collection: &str, body: Value) -> AppResult<String>;

    /// Run a filtered, ordered, limited scan
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid query, or a database error
    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>>;

    /// Delete every document whose `field` equals `value`; returns the number deleted
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid field, or a database error
    async fn delete_where(&self, collection: &str, field: &str, value: &Value) -> AppResult<u64>;
}

/// Open the store named by a `DATABASE_URL`
///
/// # Errors
///
/// Returns a database error if the `SQLite` file cannot be opened or migrated
pub async fn create_store(
    url: &DatabaseUrl,
    logger: AppLogger,
) -> AppResult<Arc<dyn DocumentStore>> {
    match url {
        DatabaseUrl::Memory => {
            logger.info("Using in-memory document store");
            Ok(Arc::new(MemoryDocumentStore::new(logger)))
        }
        DatabaseUrl::SQLite { .. } => {
            let store = SqliteDocumentStore::connect(url, logger).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Generate a document key
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Check that a field name is a plain identifier usable in a JSON path
///
/// # Errors
///
/// Returns `InvalidInput` otherwise
pub fn validate_field(field: &str) -> AppResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "Invalid document field name '{field}'"
        )))
    }
}

/// Require a JSON object body
///
/// # Errors
///
/// Returns `InvalidInput` for any other JSON value
pub fn expect_object(body: Value) -> AppResult<Map<String, Value>> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(AppError::invalid_input(format!(
            "Documents must be JSON objects, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Overwrite top-level keys of `target` with those of `partial`
pub fn shallow_merge(target: &mut Map<String, Value>, partial: Map<String, Value>) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}

/// Total order over JSON scalars matching `SQLite`'s ordering of `json_extract` results:
/// null < numbers < strings; booleans compare as 0/1
#[must_use]
pub fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_) | Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Array(_) | Value::Object(_)) => 3,
        }
    }
    fn as_number(value: Option<&Value>) -> f64 {
        match value {
            Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
            _ => as_number(a).total_cmp(&as_number(b)),
        },
        unequal => unequal,
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Timestamp codec with fixed microsecond precision
///
/// Stored timestamps must sort lexicographically in chronological order, which the
/// variable-width default RFC 3339 rendering does not guarantee.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Render a timestamp the way documents store it
    #[must_use]
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Current time in stored form
    #[must_use]
    pub fn now() -> String {
        format(&Utc::now())
    }

    /// Serialize with fixed precision
    ///
    /// # Errors
    ///
    /// Returns the serializer's error
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    /// Deserialize any RFC 3339 timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not RFC 3339
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_validation() {
        assert!(validate_field("timestamp").is_ok());
        assert!(validate_field("user_id").is_ok());
        assert!(validate_field("").is_err());
        assert!(validate_field("a'); DROP TABLE documents; --").is_err());
        assert!(validate_field("nested.path").is_err());
    }

    #[test]
    fn test_query_rejects_object_filter() {
        let query = Query::new().filter_eq("user_id", json!({"$ne": null}));
        assert!(query.validate().is_err());
        assert!(Query::latest_for_user("u1", 5).validate().is_ok());
    }

    #[test]
    fn test_compare_json_orders_like_sqlite() {
        let null = Value::Null;
        let two = json!(2);
        let ten = json!(10.5);
        let text = json!("a");
        assert_eq!(compare_json(Some(&null), Some(&two)), Ordering::Less);
        assert_eq!(compare_json(Some(&two), Some(&ten)), Ordering::Less);
        assert_eq!(compare_json(Some(&ten), Some(&text)), Ordering::Less);
        assert_eq!(compare_json(None, Some(&text)), Ordering::Less);
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        use chrono::TimeZone;
        let whole = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let later = whole + chrono::Duration::milliseconds(500);
        assert!(timestamp::format(&whole) < timestamp::format(&later));
        assert_eq!(timestamp::format(&whole), "2025-03-01T12:00:00.000000Z");
    }
}
