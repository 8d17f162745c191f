// ABOUTME: Configuration module for centralized server settings
// ABOUTME: Environment-driven server config plus the metrics coefficient tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Configuration for the GlucoWise server
//!
//! - **Environment**: ports, document store, identity, LLM, vision, classifier, limits
//! - **Metrics**: Harris-Benedict coefficients, activity multipliers, macro splits

/// Environment and server configuration
pub mod environment;

pub use environment::{
    ClarifaiConfig, ClassifierConfig, DatabaseUrl, Environment, FirebaseConfig, GeminiConfig,
    LimitsConfig, ServerConfig,
};
pub use glucowise_intelligence::config::{
    ActivityFactorsConfig, BmrConfig, MacroSplitConfig, MetricsConfig,
};
