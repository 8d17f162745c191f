// ABOUTME: Health check route handlers for service monitoring and load balancers
// ABOUTME: Liveness always answers; readiness round-trips the document store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::resources::ServerResources;
use crate::store::collections;

/// Key that never exists; reading it proves the store answers
const READINESS_PROBE_KEY: &str = "__readiness_probe__";

/// Monitoring routes implementation
pub struct MonitoringRoutes;

impl MonitoringRoutes {
    /// Create `/health` and `/ready`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .route("/ready", get(Self::ready))
            .with_state(resources)
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "version": resources.config.server_version,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn ready(State(resources): State<Arc<ServerResources>>) -> (StatusCode, Json<Value>) {
        match resources
            .store
            .get(collections::USERS, READINESS_PROBE_KEY)
            .await
        {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({
                    "status": "ready",
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            ),
            Err(e) => {
                resources
                    .logger
                    .warn(&format!("Readiness probe failed: {e}"));
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "status": "unavailable",
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                )
            }
        }
    }
}
