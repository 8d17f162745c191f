// ABOUTME: Food recognition seam: identify the dominant food in an uploaded photo
// ABOUTME: The recipe flow depends on the trait so tests can substitute a fixed recognizer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

/// Clarifai food-item-recognition client
pub mod clarifai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

pub use clarifai::{ClarifaiModelRef, ClarifaiRecognizer};

/// Top concept predicted for an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodConcept {
    /// Food name, e.g. "pizza"
    pub name: String,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
}

/// Identifies food in images
#[async_trait]
pub trait FoodRecognizer: Send + Sync {
    /// Return the most likely food, or `None` when nothing was detected
    ///
    /// # Errors
    ///
    /// Returns an external service error if the vision call fails
    async fn recognize(&self, image: &[u8]) -> AppResult<Option<FoodConcept>>;
}
