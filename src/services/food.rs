// ABOUTME: Food features: recipe generation from a photographed dish and macro lookups by name
// ABOUTME: Vision recognition feeds the recipe prompt; every answer is appended to the user's history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{missing, recent_records, to_body};
use crate::errors::{AppError, AppResult};
use crate::llm::{generate_structured, prompts, LlmProvider};
use crate::logging::AppLogger;
use crate::models::{DietQueryRecord, MacroBreakdown, Recipe, RecipeQueryRecord};
use crate::store::{collections, timestamp, DocumentStore};
use crate::vision::FoodRecognizer;

/// One past macro lookup as shown to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietHistoryEntry {
    /// Food that was looked up
    pub food_item: String,
    /// Macro lines returned
    pub macro_breakdown: Vec<MacroBreakdown>,
    /// When the lookup happened
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl From<DietQueryRecord> for DietHistoryEntry {
    fn from(record: DietQueryRecord) -> Self {
        Self {
            food_item: record.food_item,
            macro_breakdown: record.response,
            timestamp: record.timestamp,
        }
    }
}

/// Recipes from photos and macro breakdowns
pub struct FoodService {
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmProvider>,
    vision: Arc<dyn FoodRecognizer>,
    history_limit: usize,
    logger: AppLogger,
}

impl FoodService {
    /// Create the service; diet history returns at most `history_limit` entries
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmProvider>,
        vision: Arc<dyn FoodRecognizer>,
        history_limit: usize,
        logger: AppLogger,
    ) -> Self {
        Self {
            store,
            llm,
            vision,
            history_limit,
            logger,
        }
    }

    /// Recognize the dish in `image` and generate diabetes-friendly recipes for it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` ("No food detected") when recognition finds nothing, or
    /// the vision or model error
    #[instrument(skip(self, image), fields(user.id = %user_id, image_bytes = image.len()))]
    pub async fn recipe_from_image(&self, user_id: &str, image: &[u8]) -> AppResult<Vec<Recipe>> {
        let Some(food) = self.vision.recognize(image).await? else {
            warn!(parent: self.logger.span(), user.id = %user_id, "No food detected in image");
            return Err(AppError::invalid_input("No food detected"));
        };

        let recipe: Vec<Recipe> = generate_structured(
            self.llm.as_ref(),
            prompts::recipe_prompt(&food.name),
            prompts::recipe_schema(),
        )
        .await?;

        let record = RecipeQueryRecord {
            user_id: user_id.to_owned(),
            food_name: food.name,
            confidence: food.confidence,
            recipe,
            timestamp: Utc::now(),
        };
        self.store
            .add(collections::RECIPE_QUERIES, to_body(&record)?)
            .await?;

        info!(
            parent: self.logger.span(),
            user.id = %user_id,
            food = %record.food_name,
            confidence = record.confidence,
            "Recipe generated"
        );
        Ok(record.recipe)
    }

    /// Macro breakdown for a named food
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` ("Food item is required") for a blank name, or the
    /// model's error
    #[instrument(skip(self), fields(user.id = %user_id))]
    pub async fn macro_breakdown(
        &self,
        user_id: &str,
        food_item: &str,
    ) -> AppResult<Vec<MacroBreakdown>> {
        let food_item = food_item.trim();
        if food_item.is_empty() {
            return Err(AppError::invalid_input("Food item is required"));
        }

        let response: Vec<MacroBreakdown> = generate_structured(
            self.llm.as_ref(),
            prompts::macro_breakdown_prompt(food_item),
            prompts::macro_breakdown_schema(),
        )
        .await?;

        let record = DietQueryRecord {
            user_id: user_id.to_owned(),
            food_item: food_item.to_owned(),
            response,
            timestamp: Utc::now(),
        };
        self.store
            .add(collections::DIET_QUERIES, to_body(&record)?)
            .await?;

        self.logger.log_computation("macro_breakdown", user_id);
        Ok(record.response)
    }

    /// Past macro lookups, newest first
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` ("No diet query history found") when there are none
    pub async fn diet_history(&self, user_id: &str) -> AppResult<Vec<DietHistoryEntry>> {
        let entries: Vec<DietHistoryEntry> = recent_records::<DietQueryRecord>(
            self.store.as_ref(),
            collections::DIET_QUERIES,
            user_id,
            self.history_limit,
        )
        .await?
        .into_iter()
        .map(|(_, record)| record.into())
        .collect();

        if entries.is_empty() {
            return Err(missing("No diet query history found"));
        }
        Ok(entries)
    }
}
