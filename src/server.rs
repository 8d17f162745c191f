// ABOUTME: HTTP server assembly: merges the route groups and applies the tower middleware stack
// ABOUTME: Serves on the configured address until ctrl-c, then drains in-flight requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, middleware, Router};
use http::{header::HeaderName, Method};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::middleware::attach_request_id;
use crate::resources::ServerResources;
use crate::routes::{FoodRoutes, HealthRoutes, MonitoringRoutes, UserRoutes};

/// Configure CORS for the mobile and web clients
///
/// Any origin is allowed; credentials travel in the `Authorization` header, not cookies.
fn setup_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600))
}

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let limits = resources.config.limits;

    Router::new()
        .merge(MonitoringRoutes::routes(resources.clone()))
        .merge(UserRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(FoodRoutes::routes(resources))
        .layer(middleware::from_fn(attach_request_id))
        .layer(DefaultBodyLimit::max(limits.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_upload_bytes))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(
            limits.request_timeout_secs,
        )))
        .layer(setup_cors())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Bind and serve until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn serve(resources: Arc<ServerResources>) -> Result<()> {
    let address = format!("{}:{}", resources.config.host, resources.config.http_port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("GlucoWise API listening on http://{address}");
    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated with an error")?;

    info!("Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {e}");
        return;
    }
    info!("Shutdown signal received, draining connections");
}

