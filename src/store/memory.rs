// ABOUTME: In-memory document store backed by a tokio RwLock over per-collection maps
// ABOUTME: Same query semantics as the SQLite backend; used for tests and DATABASE_URL=sqlite::memory:
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    compare_json, expect_object, generate_id, shallow_merge, validate_field, Document,
    DocumentStore, Query, SortDirection,
};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

type Collection = BTreeMap<String, Map<String, Value>>;

/// Process-local [`DocumentStore`]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    logger: AppLogger,
}

impl MemoryDocumentStore {
    /// Create an empty store
    #[must_use]
    pub fn new(logger: AppLogger) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            logger,
        }
    }

    fn record(&self, operation: &str, collection: &str, started: Instant, success: bool) {
        self.logger.log_store_operation(
            operation,
            collection,
            success,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
    }
}

fn matches(body: &Map<String, Value>, field: &str, value: &Value) -> bool {
    match (body.get(field), value) {
        (None | Some(Value::Null), Value::Null) => true,
        (Some(Value::Bool(flag)), Value::Number(n)) | (Some(Value::Number(n)), Value::Bool(flag)) => {
            n.as_i64() == Some(i64::from(*flag))
        }
        (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Some(stored), expected) => stored == expected,
        (None, _) => false,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let started = Instant::now();
        let document = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .and_then(|docs| docs.get(id))
                .map(|body| Document {
                    id: id.to_owned(),
                    body: Value::Object(body.clone()),
                })
        };
        self.record("get", collection, started, true);
        Ok(document)
    }

    async fn put(&self, collection: &str, id: &str, body: Value) -> AppResult<()> {
        let started = Instant::now();
        let body = expect_object(body)?;
        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), body);
        self.record("put", collection, started, true);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, partial: Value) -> AppResult<()> {
        let started = Instant::now();
        let partial = expect_object(partial)?;
        let found = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
                Some(body) => {
                    shallow_merge(body, partial);
                    true
                }
                None => false,
            }
        };
        self.record("update", collection, started, found);
        if found {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Document {collection}/{id}")))
        }
    }

    async fn add(&self, collection: &str, body: Value) -> AppResult<String> {
        let id = generate_id();
        self.put(collection, &id, body).await?;
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>> {
        let started = Instant::now();
        query.validate()?;

        let mut documents: Vec<Document> = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|(_, body)| {
                            query
                                .filter
                                .as_ref()
                                .is_none_or(|(field, value)| matches(body, field, value))
                        })
                        .map(|(id, body)| Document {
                            id: id.clone(),
                            body: Value::Object(body.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some((field, direction)) = &query.order_by {
            documents.sort_by(|a, b| {
                let ordering = compare_json(a.body.get(field), b.body.get(field));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        self.record("query", collection, started, true);
        Ok(documents)
    }

    async fn delete_where(&self, collection: &str, field: &str, value: &Value) -> AppResult<u64> {
        let started = Instant::now();
        validate_field(field)?;
        let removed = {
            let mut collections = self.collections.write().await;
            collections.get_mut(collection).map_or(0, |docs| {
                let before = docs.len();
                docs.retain(|_, body| !matches(body, field, value));
                before - docs.len()
            })
        };
        self.record("delete_where", collection, started, true);
        Ok(removed as u64)
    }
}
