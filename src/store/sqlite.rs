// ABOUTME: SQLite document store: JSON bodies in a single documents table keyed by (collection, id)
// ABOUTME: Filters and ordering use json_extract so ORDER BY ... LIMIT runs inside SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Row, SqlitePool};

use super::{expect_object, generate_id, shallow_merge, validate_field, Document, DocumentStore, Query};
use crate::config::DatabaseUrl;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// `SQLite`-backed [`DocumentStore`]
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    logger: AppLogger,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database file and run migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if the connection or migration fails
    pub async fn connect(url: &DatabaseUrl, logger: AppLogger) -> AppResult<Self> {
        if let DatabaseUrl::SQLite { path } = url {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::database(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_string = match url {
            DatabaseUrl::SQLite { .. } => format!("{}?mode=rwc", url.to_connection_string()),
            DatabaseUrl::Memory => url.to_connection_string(),
        };

        let pool = SqlitePool::connect(&connection_string)
            .await
            .map_err(|e| AppError::database(format!("Failed to open {url}: {e}")))?;

        let store = Self::new(pool, logger);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool; call [`Self::migrate`] before use
    #[must_use]
    pub const fn new(pool: SqlitePool, logger: AppLogger) -> Self {
        Self { pool, logger }
    }

    /// Get a reference to the pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the documents table and its indexes
    ///
    /// # Errors
    ///
    /// Returns a database error if the DDL fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL CHECK (json_valid(body)),
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (collection, id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create documents table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(collection, json_extract(body, '$.user_id'))",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create documents index: {e}")))?;

        Ok(())
    }

    fn elapsed_ms(started: Instant) -> u64 {
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn record<T>(&self, operation: &str, collection: &str, started: Instant, result: &AppResult<T>) {
        self.logger.log_store_operation(
            operation,
            collection,
            result.is_ok(),
            Self::elapsed_ms(started),
        );
    }

    async fn fetch_body(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get document: {e}")))?;

        row.map(|r| parse_body(&r.get::<String, _>("body")))
            .transpose()
    }

    async fn write_body(&self, collection: &str, id: &str, body: &Value) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(body.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to write document: {e}")))?;
        Ok(())
    }
}

// ============================================================================
// DocumentStore Implementation
// ============================================================================

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let started = Instant::now();
        let result = self.fetch_body(collection, id).await.map(|body| {
            body.map(|body| Document {
                id: id.to_owned(),
                body,
            })
        });
        self.record("get", collection, started, &result);
        result
    }

    async fn put(&self, collection: &str, id: &str, body: Value) -> AppResult<()> {
        let started = Instant::now();
        let body = Value::Object(expect_object(body)?);
        let result = self.write_body(collection, id, &body).await;
        self.record("put", collection, started, &result);
        result
    }

    async fn update(&self, collection: &str, id: &str, partial: Value) -> AppResult<()> {
        let started = Instant::now();
        let partial = expect_object(partial)?;

        // Read-merge-write inside one transaction
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to get document: {e}")))?;

        let Some(row) = row else {
            let result = Err(AppError::not_found(format!("Document {collection}/{id}")));
            self.record::<()>("update", collection, started, &result);
            return result;
        };

        let mut body = expect_object(parse_body(&row.get::<String, _>("body"))?)?;
        shallow_merge(&mut body, partial);

        sqlx::query(
            r"
            UPDATE documents SET body = $3, updated_at = CURRENT_TIMESTAMP
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(body).to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update document: {e}")))?;

        let result = tx
            .commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit update: {e}")));
        self.record("update", collection, started, &result);
        result
    }

    async fn add(&self, collection: &str, body: Value) -> AppResult<String> {
        let started = Instant::now();
        let body = Value::Object(expect_object(body)?);
        let id = generate_id();
        let result = self.write_body(collection, &id, &body).await.map(|()| id);
        self.record("add", collection, started, &result);
        result
    }

    async fn query(&self, collection: &str, query: &Query) -> AppResult<Vec<Document>> {
        let started = Instant::now();
        query.validate()?;

        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
        let mut args = SqliteArguments::default();
        args.add(collection)
            .map_err(|e| AppError::database(format!("Failed to bind collection: {e}")))?;

        if let Some((field, value)) = &query.filter {
            push_equality(&mut sql, &mut args, field, value)?;
        }
        if let Some((field, direction)) = &query.order_by {
            sql.push_str(" ORDER BY json_extract(body, ?) ");
            sql.push_str(direction.as_sql());
            args.add(json_path(field))
                .map_err(|e| AppError::database(format!("Failed to bind order field: {e}")))?;
        }
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            args.add(i64::try_from(limit).unwrap_or(i64::MAX))
                .map_err(|e| AppError::database(format!("Failed to bind limit: {e}")))?;
        }

        let result = sqlx::query_with(&sql, args)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to query {collection}: {e}")))
            .and_then(|rows| rows.iter().map(row_to_document).collect());
        self.record("query", collection, started, &result);
        result
    }

    async fn delete_where(&self, collection: &str, field: &str, value: &Value) -> AppResult<u64> {
        let started = Instant::now();
        validate_field(field)?;

        let mut sql = String::from("DELETE FROM documents WHERE collection = ?");
        let mut args = SqliteArguments::default();
        args.add(collection)
            .map_err(|e| AppError::database(format!("Failed to bind collection: {e}")))?;
        push_equality(&mut sql, &mut args, field, value)?;

        let result = sqlx::query_with(&sql, args)
            .execute(&self.pool)
            .await
            .map(|done| done.rows_affected())
            .map_err(|e| AppError::database(format!("Failed to delete from {collection}: {e}")));
        self.record("delete_where", collection, started, &result);
        result
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn parse_body(text: &str) -> AppResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| AppError::database(format!("Stored document is not valid JSON: {e}")))
}

fn row_to_document(row: &SqliteRow) -> AppResult<Document> {
    Ok(Document {
        id: row.get("id"),
        body: parse_body(&row.get::<String, _>("body"))?,
    })
}

/// Append `AND json_extract(body, '$.field') = ?` with the value bound as its SQL type
fn push_equality(
    sql: &mut String,
    args: &mut SqliteArguments<'_>,
    field: &str,
    value: &Value,
) -> AppResult<()> {
    let bind_error = |e| AppError::database(format!("Failed to bind filter on '{field}': {e}"));

    sql.push_str(" AND json_extract(body, ?)");
    args.add(json_path(field)).map_err(bind_error)?;

    match value {
        Value::Null => {
            sql.push_str(" IS NULL");
            return Ok(());
        }
        Value::Bool(flag) => args.add(i64::from(*flag)).map_err(bind_error)?,
        Value::Number(n) => match n.as_i64() {
            Some(int) => args.add(int).map_err(bind_error)?,
            None => args.add(n.as_f64().unwrap_or(f64::NAN)).map_err(bind_error)?,
        },
        Value::String(text) => args.add(text.clone()).map_err(bind_error)?,
        Value::Array(_) | Value::Object(_) => {
            return Err(AppError::invalid_input(format!(
                "Filter on '{field}' must compare against a scalar value"
            )));
        }
    }
    sql.push_str(" = ?");
    Ok(())
}
