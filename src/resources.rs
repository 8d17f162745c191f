// ABOUTME: Shared resource container handed to every route group as axum state
// ABOUTME: Wires the document store, external clients and classifier into the domain services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Server Resources
//!
//! Built once at startup. Route handlers receive `Arc<ServerResources>` and never
//! construct clients or services themselves.

use std::sync::Arc;

use glucowise_intelligence::{
    BinaryClassifier, MetricsCalculator, MetricsConfig, RiskClassifierAdapter,
};

use crate::auth::{IdentityProvider, TokenVerifier};
use crate::config::ServerConfig;
use crate::llm::LlmProvider;
use crate::logging::AppLogger;
use crate::services::{ChatService, FoodService, HealthService, ProfileService};
use crate::store::DocumentStore;
use crate::vision::FoodRecognizer;

/// Hosted services the server talks to
#[derive(Clone)]
pub struct ExternalServices {
    /// ID-token verification
    pub verifier: Arc<dyn TokenVerifier>,
    /// Email/password sign-up and sign-in
    pub identity: Arc<dyn IdentityProvider>,
    /// Language model
    pub llm: Arc<dyn LlmProvider>,
    /// Food recognition
    pub vision: Arc<dyn FoodRecognizer>,
}

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Validated server configuration
    pub config: Arc<ServerConfig>,
    /// Document store shared by every service; probed by `/ready`
    pub store: Arc<dyn DocumentStore>,
    /// Bearer token verification for authenticated routes
    pub verifier: Arc<dyn TokenVerifier>,
    /// Email/password sign-up and sign-in
    pub identity: Arc<dyn IdentityProvider>,
    /// User documents and profiles
    pub profiles: Arc<ProfileService>,
    /// Metrics, diabetes checks, plans and advice
    pub health: Arc<HealthService>,
    /// Assistant chat and its history
    pub chat: Arc<ChatService>,
    /// Recipes from photos and diet queries
    pub food: Arc<FoodService>,
    /// Logger for route handlers
    pub logger: AppLogger,
}

impl ServerResources {
    /// Build the services on top of an opened store and loaded classifier
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        store: Arc<dyn DocumentStore>,
        external: ExternalServices,
        classifier: Arc<dyn BinaryClassifier>,
        metrics_config: MetricsConfig,
        logger: &AppLogger,
    ) -> Self {
        let limits = config.limits;

        let profiles = Arc::new(ProfileService::new(
            store.clone(),
            logger.child("profile_service"),
        ));
        let health = Arc::new(HealthService::new(
            store.clone(),
            MetricsCalculator::new(metrics_config, logger.child("metrics")),
            RiskClassifierAdapter::new(classifier, logger.child("risk_classifier")),
            external.llm.clone(),
            logger.child("health_service"),
        ));
        let chat = Arc::new(ChatService::new(
            store.clone(),
            external.llm.clone(),
            limits.chat_history_limit,
            logger.child("chat_service"),
        ));
        let food = Arc::new(FoodService::new(
            store.clone(),
            external.llm,
            external.vision,
            limits.diet_history_limit,
            logger.child("food_service"),
        ));

        Self {
            config,
            store,
            verifier: external.verifier,
            identity: external.identity,
            profiles,
            health,
            chat,
            food,
            logger: logger.child("routes"),
        }
    }
}
