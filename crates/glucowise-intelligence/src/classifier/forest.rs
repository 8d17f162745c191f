// ABOUTME: Random-forest classifier loaded from a JSON tree export and evaluated in-process
// ABOUTME: Validates schema version, column names, and node topology before serving predictions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! JSON forest artifact:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "feature_names": ["year", "gender", ...],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 13, "threshold": 6.7, "left": 1, "right": 2 },
//!         { "value": [0.97, 0.03] },
//!         { "value": [0.12, 0.88] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends `x[feature] <= threshold` to `left`. Leaf values are class weights
//! and are normalized per tree. Tree probabilities are averaged and the larger class
//! wins, with ties going to class 0. Children must have a higher index than their
//! parent, which rules out cycles.

use std::path::Path;

use glucowise_core::errors::DomainError;
use serde::{Deserialize, Serialize};

use super::{BinaryClassifier, ModelError};
use crate::encoder::{FEATURE_COUNT, FEATURE_NAMES};

/// Artifact layout version this loader understands
pub const FOREST_SCHEMA_VERSION: u32 = 1;

/// One decision-tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Internal split
    Split {
        /// Column index tested
        feature: usize,
        /// Split threshold (`<=` goes left)
        threshold: f64,
        /// Index of the left child
        left: usize,
        /// Index of the right child
        right: usize,
    },
    /// Terminal node with per-class weights `[no, yes]`
    Leaf {
        /// Class weights
        value: [f64; 2],
    },
}

/// One decision tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Nodes in export order
    pub nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, tree_index: usize) -> Result<(), DomainError> {
        if self.nodes.is_empty() {
            return Err(DomainError::artifact(format!("tree {tree_index} has no nodes")));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(DomainError::artifact(format!(
                            "tree {tree_index} node {index} tests feature {feature}, only {FEATURE_COUNT} exist"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(DomainError::artifact(format!(
                            "tree {tree_index} node {index} has a non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(DomainError::artifact(format!(
                                "tree {tree_index} node {index} points to invalid child {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
                        return Err(DomainError::artifact(format!(
                            "tree {tree_index} leaf {index} has invalid class weights"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Probability of class 1 for one row
    ///
    /// A root-to-leaf path visits each node at most once, so the walk gives up after
    /// `nodes.len()` steps on trees that skipped validation.
    fn positive_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature)
                        .copied()
                        .ok_or(ModelError::DimensionMismatch {
                            expected: FEATURE_COUNT,
                            actual: features.len(),
                        })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { value: [no, yes] }) => return Ok(yes / (no + yes)),
                None => {
                    return Err(ModelError::Backend(format!(
                        "tree walk reached missing node {index}"
                    )))
                }
            }
        }
        Err(ModelError::Backend(format!(
            "tree walk did not reach a leaf within {} steps",
            self.nodes.len()
        )))
    }
}

/// Random forest over the risk feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Artifact layout version
    pub schema_version: u32,
    /// Column names the forest was trained on
    pub feature_names: Vec<String>,
    /// Ensemble members
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Read and validate an artifact file
    ///
    /// # Errors
    ///
    /// Returns `ModelArtifact` if the file is unreadable, malformed, or inconsistent
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::artifact(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact document
    ///
    /// # Errors
    ///
    /// Returns `ModelArtifact` if the document is malformed or inconsistent
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let model: Self = serde_json::from_str(raw)
            .map_err(|e| DomainError::artifact(format!("malformed forest JSON: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    /// Check version, column names, and every tree
    ///
    /// # Errors
    ///
    /// Returns `ModelArtifact` describing the first inconsistency
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.schema_version != FOREST_SCHEMA_VERSION {
            return Err(DomainError::artifact(format!(
                "unsupported schema version {} (expected {FOREST_SCHEMA_VERSION})",
                self.schema_version
            )));
        }

        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(got, expected)| got != expected)
        {
            return Err(DomainError::artifact(format!(
                "feature names {:?} do not match encoder columns {FEATURE_NAMES:?}",
                self.feature_names
            )));
        }

        if self.trees.is_empty() {
            return Err(DomainError::artifact("forest has no trees"));
        }

        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index)?;
        }
        Ok(())
    }

    /// Averaged probability of class 1
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a row of the wrong width or with non-finite values
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != FEATURE_COUNT {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }
        if let Some(column) = features.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite(FEATURE_NAMES[column]));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.positive_probability(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

impl BinaryClassifier for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        let yes = self.predict_proba(features)?;
        Ok(u8::from(yes > 1.0 - yes))
    }

    fn describe(&self) -> String {
        format!("random forest ({} trees)", self.trees.len())
    }
}
