// ABOUTME: Health computations for a stored profile: body metrics, diabetes risk, diet plans, advice
// ABOUTME: Every computation is appended to its history collection; "latest" reads are store-ordered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Health Service
//!
//! | Operation | Profile fields needed | Writes |
//! |-----------|----------------------|--------|
//! | [`HealthService::calculate_metrics`] | body measurements | `users/{uid}.last_metrics` |
//! | [`HealthService::diabetes_check`] | complete profile | `diabetes_checks` |
//! | [`HealthService::generate_plan`] | complete profile | `plans` |
//! | [`HealthService::generate_advice`] | body measurements | `advice` |

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use glucowise_intelligence::{DerivedMetrics, MetricsCalculator, RiskClassifierAdapter, RiskInput};

use super::{latest_record, load_user, missing, to_body};
use crate::errors::AppResult;
use crate::llm::{generate_structured, prompts, LlmProvider};
use crate::logging::AppLogger;
use crate::models::{
    AdviceMetrics, AdviceRecord, DiabetesCheckRecord, DietPlanEntry, HealthAdvice, PlanRecord,
    StoredMetrics, UserRecord,
};
use crate::store::{collections, DocumentStore};

/// Metrics, risk and generated guidance for a user's stored profile
pub struct HealthService {
    store: Arc<dyn DocumentStore>,
    metrics: MetricsCalculator,
    classifier: RiskClassifierAdapter,
    llm: Arc<dyn LlmProvider>,
    logger: AppLogger,
}

impl HealthService {
    /// Create the service
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        metrics: MetricsCalculator,
        classifier: RiskClassifierAdapter,
        llm: Arc<dyn LlmProvider>,
        logger: AppLogger,
    ) -> Self {
        Self {
            store,
            metrics,
            classifier,
            llm,
            logger,
        }
    }

    async fn user(&self, user_id: &str) -> AppResult<UserRecord> {
        load_user(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| missing("User not found"))
    }

    // ========================================================================
    // Body Metrics
    // ========================================================================

    /// Compute BMI, BMR, TDEE and macros and save them as `last_metrics`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown user and `InvalidInput` when body
    /// measurements are missing or zero
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn calculate_metrics(&self, user_id: &str) -> AppResult<DerivedMetrics> {
        let user = self.user(user_id).await?;
        let derived = self.metrics.derive(&user.profile.to_body()?)?;

        let snapshot = StoredMetrics {
            metrics: derived,
            calculated_at: Utc::now(),
        };
        self.store
            .update(
                collections::USERS,
                user_id,
                json!({ "last_metrics": to_body(&snapshot)? }),
            )
            .await?;

        self.logger.log_computation("calculate_metrics", user_id);
        Ok(derived)
    }

    /// The snapshot saved by the last [`Self::calculate_metrics`]
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user or the snapshot is missing
    pub async fn last_metrics(&self, user_id: &str) -> AppResult<StoredMetrics> {
        self.user(user_id)
            .await?
            .last_metrics
            .ok_or_else(|| missing("No metrics found"))
    }

    // ========================================================================
    // Diabetes Risk
    // ========================================================================

    /// Classify diabetes risk from the current profile and append it to history
    ///
    /// BMI is recomputed from the stored height and weight.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an incomplete profile and `ClassifierInference` if
    /// the model fails
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn diabetes_check(&self, user_id: &str) -> AppResult<DiabetesCheckRecord> {
        let profile = self.user(user_id).await?.profile.to_profile()?;
        let reading = self.metrics.bmi_for(&profile.body())?;
        let assessment = self
            .classifier
            .assess(&RiskInput::from_profile(&profile, reading.bmi))?;

        let record = DiabetesCheckRecord {
            user_id: user_id.to_owned(),
            assessment,
            bmi: reading.bmi,
            timestamp: Utc::now(),
        };
        self.store
            .add(collections::DIABETES_CHECKS, to_body(&record)?)
            .await?;

        info!(
            parent: self.logger.span(),
            user.id = %user_id,
            prediction = %record.assessment.prediction,
            "Diabetes check recorded"
        );
        Ok(record)
    }

    /// Most recent diabetes check
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("No diabetes check found") if there is none
    pub async fn latest_check(&self, user_id: &str) -> AppResult<DiabetesCheckRecord> {
        latest_record(self.store.as_ref(), collections::DIABETES_CHECKS, user_id)
            .await?
            .map(|(_, record)| record)
            .ok_or_else(|| missing("No diabetes check found"))
    }

    // ========================================================================
    // Diet Plans
    // ========================================================================

    /// Generate a diet plan for the profile and append it to `plans`
    ///
    /// Returns the new plan's document ID with the record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an incomplete profile, or the model's error
    #[instrument(skip(self, preferences), fields(user.id = %user_id))]
    pub async fn generate_plan(
        &self,
        user_id: &str,
        preferences: Option<String>,
    ) -> AppResult<(String, PlanRecord)> {
        let user = self.user(user_id).await?;
        let profile = user.profile.to_profile()?;
        let derived = self.metrics.derive(&profile.body())?;
        let preferences = preferences
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| prompts::DEFAULT_PREFERENCES.to_owned());
        let vegan = user.profile.vegan.unwrap_or(false);

        let plan: Vec<DietPlanEntry> = generate_structured(
            self.llm.as_ref(),
            prompts::diet_plan_prompt(&profile, &derived, &preferences, vegan),
            prompts::diet_plan_schema(),
        )
        .await?;

        let record = PlanRecord {
            user_id: user_id.to_owned(),
            preferences,
            plan,
            timestamp: Utc::now(),
        };
        let plan_id = self.store.add(collections::PLANS, to_body(&record)?).await?;

        self.logger.log_computation("diet_plan", user_id);
        Ok((plan_id, record))
    }

    /// Most recent diet plan with its document ID
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("No plan found") if there is none
    pub async fn latest_plan(&self, user_id: &str) -> AppResult<(String, PlanRecord)> {
        latest_record(self.store.as_ref(), collections::PLANS, user_id)
            .await?
            .ok_or_else(|| missing("No plan found"))
    }

    // ========================================================================
    // Health Advice
    // ========================================================================

    /// Generate health advice from body metrics and append it to `advice`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when body measurements are missing, or the model's error
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn generate_advice(&self, user_id: &str) -> AppResult<AdviceRecord> {
        let body = self.user(user_id).await?.profile.to_body()?;
        let derived = self.metrics.derive(&body)?;

        let advice: Vec<HealthAdvice> = generate_structured(
            self.llm.as_ref(),
            prompts::health_advice_prompt(&body, &derived),
            prompts::health_advice_schema(),
        )
        .await?;

        let record = AdviceRecord {
            user_id: user_id.to_owned(),
            advice,
            metrics: AdviceMetrics::from(&derived),
            timestamp: Utc::now(),
        };
        self.store
            .add(collections::ADVICE, to_body(&record)?)
            .await?;

        self.logger.log_computation("health_advice", user_id);
        Ok(record)
    }

    /// Most recent advice
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("No advice found") if there is none
    pub async fn latest_advice(&self, user_id: &str) -> AppResult<AdviceRecord> {
        latest_record(self.store.as_ref(), collections::ADVICE, user_id)
            .await?
            .map(|(_, record)| record)
            .ok_or_else(|| missing("No advice found"))
    }
}
