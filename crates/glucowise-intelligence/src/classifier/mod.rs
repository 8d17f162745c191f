// ABOUTME: Diabetes-risk classifier adapter: binary classifier trait, inference errors, and label mapping
// ABOUTME: The model is loaded once and shared read-only behind an Arc for the process lifetime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Risk Classifier Adapter
//!
//! Wraps any [`BinaryClassifier`] and turns its raw label into a
//! [`RiskAssessment`]. Label `1` means "yes" and `0` means "no"; any other label and
//! any backend failure surface as `DomainError::ClassifierInference`. Nothing is
//! retried since inference over the same vector is deterministic.

mod forest;

use std::fmt;
use std::sync::Arc;

use glucowise_core::{errors::DomainError, AppLogger};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoder::{encode, FeatureVector, RiskInput};

pub use forest::{ForestModel, Node, Tree, FOREST_SCHEMA_VERSION};

/// Failure inside a classifier backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Input had a different number of columns than the model was trained on
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Width the model requires
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },

    /// A feature value was NaN or infinite
    #[error("feature '{0}' is not a finite number")]
    NonFinite(&'static str),

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

/// A pre-trained model mapping a feature vector to a class label
pub trait BinaryClassifier: Send + Sync {
    /// Predict the class label for one row of features
    ///
    /// # Errors
    ///
    /// Returns a `ModelError` if the model cannot score the row
    fn predict(&self, features: &[f64]) -> Result<u8, ModelError>;

    /// Short description for logs
    fn describe(&self) -> String {
        "binary classifier".to_owned()
    }
}

/// Binary screening outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    /// Classifier predicted diabetes
    Yes,
    /// Classifier predicted no diabetes
    No,
}

impl RiskLabel {
    /// Wire string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Numeric label the classifier emits for this outcome
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }

    /// Map a raw classifier label
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Yes),
            0 => Some(Self::No),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one diabetes-risk screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// "yes" or "no"
    pub prediction: RiskLabel,
    /// 1 or 0
    pub prediction_code: u8,
}

impl From<RiskLabel> for RiskAssessment {
    fn from(label: RiskLabel) -> Self {
        Self {
            prediction: label,
            prediction_code: label.code(),
        }
    }
}

/// Shares one classifier across request handlers and maps its output
#[derive(Clone)]
pub struct RiskClassifierAdapter {
    model: Arc<dyn BinaryClassifier>,
    logger: AppLogger,
}

impl fmt::Debug for RiskClassifierAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskClassifierAdapter")
            .field("model", &self.model.describe())
            .finish_non_exhaustive()
    }
}

impl RiskClassifierAdapter {
    /// Wrap a loaded model
    #[must_use]
    pub fn new(model: Arc<dyn BinaryClassifier>, logger: AppLogger) -> Self {
        Self { model, logger }
    }

    /// Encode typed input and score it
    ///
    /// # Errors
    ///
    /// Returns `ClassifierInference` if the model fails or emits a label other than 0 or 1
    pub fn assess(&self, input: &RiskInput) -> Result<RiskAssessment, DomainError> {
        self.assess_vector(&encode(input))
    }

    /// Score an already encoded vector
    ///
    /// # Errors
    ///
    /// Returns `ClassifierInference` if the model fails or emits a label other than 0 or 1
    pub fn assess_vector(&self, features: &FeatureVector) -> Result<RiskAssessment, DomainError> {
        let code = self.model.predict(features.as_slice()).map_err(|e| {
            tracing::warn!(parent: self.logger.span(), error = %e, "Classifier prediction failed");
            DomainError::classifier(e.to_string())
        })?;

        let label = RiskLabel::from_code(code).ok_or_else(|| {
            DomainError::classifier(format!("classifier returned unexpected label {code}"))
        })?;

        tracing::debug!(parent: self.logger.span(), prediction = %label, "Risk assessment computed");
        Ok(label.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u8);

    impl BinaryClassifier for Fixed {
        fn predict(&self, _features: &[f64]) -> Result<u8, ModelError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_label_codes_round_trip() {
        for label in [RiskLabel::Yes, RiskLabel::No] {
            assert_eq!(RiskLabel::from_code(label.code()), Some(label));
        }
        assert_eq!(RiskLabel::from_code(7), None);
    }

    #[test]
    fn test_out_of_range_label_is_inference_error() {
        let adapter = RiskClassifierAdapter::new(Arc::new(Fixed(2)), AppLogger::new("test"));
        let vector = encode(&RiskInput {
            sex: glucowise_core::models::Sex::Male,
            age: 30,
            location: glucowise_core::models::Jurisdiction::Ohio,
            race: glucowise_core::models::Race::Other,
            hypertension: false,
            heart_disease: false,
            smoking_history: glucowise_core::models::SmokingHistory::Never,
            bmi: 22.0,
            hba1c: 5.0,
            blood_glucose: 90.0,
        });
        let err = adapter.assess_vector(&vector).unwrap_err();
        assert!(matches!(err, DomainError::ClassifierInference(_)));
    }
}
