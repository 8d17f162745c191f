// ABOUTME: Health intelligence engine for GlucoWise: body metrics and diabetes-risk screening
// ABOUTME: Pure synchronous computation with no I/O beyond loading the classifier artifact at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

#![deny(unsafe_code)]

//! # GlucoWise Intelligence
//!
//! Leaves-first:
//!
//! - [`metrics`]: BMI and class, BMR and TDEE, macro split
//! - [`encoder`]: profile fields to the classifier's fixed feature vector
//! - [`classifier`]: pre-trained binary classifier behind a shared adapter
//!
//! Everything here is deterministic and lock-free. The only shared resource is the
//! loaded classifier, which is immutable after load.

/// Coefficient tables for the metrics chain
pub mod config;

/// Body metrics calculator
pub mod metrics;

/// Diabetes-risk feature encoder
pub mod encoder;

/// Classifier trait, forest backend, and adapter
pub mod classifier;

pub use classifier::{
    BinaryClassifier, ForestModel, ModelError, RiskAssessment, RiskClassifierAdapter, RiskLabel,
};
pub use config::MetricsConfig;
pub use encoder::{encode, encode_raw, FeatureVector, RawRiskInput, RiskInput, FEATURE_NAMES};
pub use metrics::{bmi, energy, macros, DerivedMetrics, Macros, MetricsCalculator};
