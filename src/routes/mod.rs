// ABOUTME: Route module organization for the GlucoWise HTTP API
// ABOUTME: Route groups are thin handlers that authenticate, parse, and delegate to services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Route module for the GlucoWise server
//!
//! Each domain module contains only route definitions and thin handler functions that
//! delegate to the service layer. Authenticated routes expect
//! `Authorization: Bearer <Firebase ID token>`.

/// Recipe and macro lookup routes under `/api/food`
pub mod food;
/// Metrics, diabetes check, plan and advice routes under `/api/health`
pub mod health;
/// Liveness and readiness probes
pub mod monitoring;
/// Account, profile and chat routes under `/api/user`
pub mod user;

/// Food route handlers
pub use food::FoodRoutes;
/// Health computation route handlers
pub use health::HealthRoutes;
/// Service monitoring route handlers
pub use monitoring::MonitoringRoutes;
/// User route handlers
pub use user::UserRoutes;

use axum::http::HeaderMap;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::auth::{bearer_token, AuthenticatedUser};
use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;

/// Verify the bearer token and return the caller
async fn authenticate(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> AppResult<AuthenticatedUser> {
    let token = bearer_token(headers)?;
    let user = resources.verifier.verify(token).await?;
    tracing::debug!(parent: resources.logger.span(), user.id = %user.user_id, "Request authenticated");
    Ok(user)
}

/// Parse an optional JSON body; an empty body yields `T::default()`
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("Invalid JSON body: {e}")))
}

/// Treat a missing or blank string field as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_parse_body_defaults_when_empty() {
        let value: Value = parse_body(&Bytes::from_static(b"  ")).unwrap();
        assert_eq!(value, Value::Null);

        let err = parse_body::<Value>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_present_drops_blank_strings() {
        assert_eq!(present(Some("  ".to_owned())), None);
        assert_eq!(present(Some("a".to_owned())), Some("a".to_owned()));
    }
}
