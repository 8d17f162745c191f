// ABOUTME: Computation errors raised by the metrics calculator, risk encoder, and classifier adapter
// ABOUTME: Typed with thiserror and converted into AppError at the service boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Domain Error Types
//!
//! Failures of the pure health computations. None of them is retried: every
//! operation that produces one is deterministic, so a retry cannot change the
//! outcome.

use thiserror::Error;

use super::ErrorCode;

/// Errors produced by the metrics and diabetes-risk engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Numeric input outside the domain of a formula (e.g. zero height)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A categorical value outside its closed enumeration
    #[error("Unknown {field} value '{value}'")]
    UnknownCategory {
        /// Name of the categorical field
        field: &'static str,
        /// Raw value that failed to match
        value: String,
    },

    /// The underlying classifier failed while predicting
    #[error("Classifier inference failed: {0}")]
    ClassifierInference(String),

    /// The classifier artifact could not be loaded or is inconsistent
    #[error("Classifier artifact rejected: {0}")]
    ModelArtifact(String),
}

impl DomainError {
    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an unknown category error
    #[must_use]
    pub fn unknown_category(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownCategory {
            field,
            value: value.into(),
        }
    }

    /// Create a classifier inference error
    #[must_use]
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::ClassifierInference(message.into())
    }

    /// Create a model artifact error
    #[must_use]
    pub fn artifact(message: impl Into<String>) -> Self {
        Self::ModelArtifact(message.into())
    }

    /// Map this error onto the application-wide error code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::UnknownCategory { .. } => ErrorCode::UnknownCategory,
            Self::ClassifierInference(_) => ErrorCode::ClassifierInference,
            Self::ModelArtifact(_) => ErrorCode::ConfigError,
        }
    }
}
