// ABOUTME: Health computation route handlers under /api/health
// ABOUTME: POST computes and records a new result, GET returns the latest recorded one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Health routes
//!
//! `plan`, `advice`, `diabetes_check` and `calculate_metrics` each accept POST (compute
//! and store) and GET (latest stored result, 404 when there is none).

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use glucowise_intelligence::{DerivedMetrics, RiskLabel};

use super::{authenticate, parse_body};
use crate::errors::AppError;
use crate::models::{AdviceMetrics, DietPlanEntry, HealthAdvice};
use crate::resources::ServerResources;
use crate::store::timestamp;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/health/plan`
#[derive(Debug, Default, Deserialize)]
pub struct PlanRequest {
    /// Free-text dietary preferences
    pub preferences: Option<String>,
}

/// A diet plan with its document ID
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    /// Meals
    pub plan: Vec<DietPlanEntry>,
    /// Document ID in `plans`
    pub plan_id: String,
    /// Creation time (GET only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Generated health advice
#[derive(Debug, Serialize, Deserialize)]
pub struct AdviceResponse {
    /// Advice sections
    pub advice: Vec<HealthAdvice>,
    /// Metrics the advice was based on
    pub metrics: AdviceMetrics,
    /// Creation time (GET only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Diabetes screening result
#[derive(Debug, Serialize, Deserialize)]
pub struct DiabetesCheckResponse {
    /// "yes" or "no"
    pub prediction: RiskLabel,
    /// 1 or 0
    pub prediction_code: u8,
    /// Caller (POST only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Creation time (GET only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Freshly computed metrics
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// Caller
    pub user_id: String,
    /// BMI, BMR, TDEE and macros
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

fn stamp(value: &DateTime<Utc>) -> Option<String> {
    Some(timestamp::format(value))
}

// ============================================================================
// Health Routes
// ============================================================================

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/health/plan",
                get(Self::latest_plan).post(Self::generate_plan),
            )
            .route(
                "/api/health/advice",
                get(Self::latest_advice).post(Self::generate_advice),
            )
            .route(
                "/api/health/diabetes_check",
                get(Self::latest_check).post(Self::diabetes_check),
            )
            .route(
                "/api/health/calculate_metrics",
                get(Self::last_metrics).post(Self::calculate_metrics),
            )
            .with_state(resources)
    }

    // ========================================================================
    // Diet Plans
    // ========================================================================

    async fn generate_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let request: PlanRequest = parse_body(&body)?;
        let (plan_id, record) = resources
            .health
            .generate_plan(&auth.user_id, request.preferences)
            .await?;
        Ok(Json(PlanResponse {
            plan: record.plan,
            plan_id,
            created_at: None,
        })
        .into_response())
    }

    async fn latest_plan(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let (plan_id, record) = resources.health.latest_plan(&auth.user_id).await?;
        Ok(Json(PlanResponse {
            created_at: stamp(&record.timestamp),
            plan: record.plan,
            plan_id,
        })
        .into_response())
    }

    // ========================================================================
    // Advice
    // ========================================================================

    async fn generate_advice(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let record = resources.health.generate_advice(&auth.user_id).await?;
        Ok(Json(AdviceResponse {
            advice: record.advice,
            metrics: record.metrics,
            timestamp: None,
        })
        .into_response())
    }

    async fn latest_advice(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let record = resources.health.latest_advice(&auth.user_id).await?;
        Ok(Json(AdviceResponse {
            timestamp: stamp(&record.timestamp),
            advice: record.advice,
            metrics: record.metrics,
        })
        .into_response())
    }

    // ========================================================================
    // Diabetes Check
    // ========================================================================

    async fn diabetes_check(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let record = resources.health.diabetes_check(&auth.user_id).await?;
        Ok(Json(DiabetesCheckResponse {
            prediction: record.assessment.prediction,
            prediction_code: record.assessment.prediction_code,
            user_id: Some(auth.user_id),
            timestamp: None,
        })
        .into_response())
    }

    async fn latest_check(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let record = resources.health.latest_check(&auth.user_id).await?;
        Ok(Json(DiabetesCheckResponse {
            prediction: record.assessment.prediction,
            prediction_code: record.assessment.prediction_code,
            user_id: None,
            timestamp: stamp(&record.timestamp),
        })
        .into_response())
    }

    // ========================================================================
    // Body Metrics
    // ========================================================================

    async fn calculate_metrics(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let metrics = resources.health.calculate_metrics(&auth.user_id).await?;
        Ok(Json(MetricsResponse {
            user_id: auth.user_id,
            metrics,
        })
        .into_response())
    }

    async fn last_metrics(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let snapshot = resources.health.last_metrics(&auth.user_id).await?;
        Ok(Json(snapshot).into_response())
    }
}
