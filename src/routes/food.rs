// ABOUTME: Food route handlers under /api/food: recipe from an uploaded photo and macro lookups
// ABOUTME: The recipe endpoint reads a multipart form with a single `file` field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{authenticate, parse_body, present};
use crate::errors::AppError;
use crate::models::{MacroBreakdown, Recipe};
use crate::resources::ServerResources;
use crate::services::DietHistoryEntry;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// Generated recipes
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeResponse {
    /// Recipes for the recognized dish
    pub recipe: Vec<Recipe>,
}

/// Body of `POST /api/food/diet`
#[derive(Debug, Default, Deserialize)]
pub struct DietRequest {
    /// Food to look up
    pub food_item: Option<String>,
}

/// Macro breakdown for one food
#[derive(Debug, Serialize, Deserialize)]
pub struct DietResponse {
    /// Food that was looked up
    pub food_item: String,
    /// Nutrient lines
    pub macro_breakdown: Vec<MacroBreakdown>,
}

/// Past macro lookups
#[derive(Debug, Serialize, Deserialize)]
pub struct DietHistoryResponse {
    /// Newest first
    pub diet_history: Vec<DietHistoryEntry>,
}

/// Food routes handler
pub struct FoodRoutes;

impl FoodRoutes {
    /// Create all food routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/food/recipes", post(Self::generate_recipe))
            .route(
                "/api/food/diet",
                get(Self::diet_history).post(Self::macro_breakdown),
            )
            .with_state(resources)
    }

    /// Pull the uploaded image out of the form
    async fn read_image(multipart: &mut Multipart) -> Result<Bytes, AppError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid_input(format!("Invalid multipart body: {e}")))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            if field.file_name().is_none_or(str::is_empty) {
                return Err(AppError::invalid_input("No file selected"));
            }
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::invalid_input(format!("Failed to read upload: {e}")))?;
            if data.is_empty() {
                return Err(AppError::invalid_input("No file selected"));
            }
            return Ok(data);
        }
        Err(AppError::invalid_input("No file uploaded"))
    }

    async fn generate_recipe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let mut multipart = multipart.map_err(|_| AppError::invalid_input("No file uploaded"))?;
        let image = Self::read_image(&mut multipart).await?;

        let recipe = resources
            .food
            .recipe_from_image(&auth.user_id, &image)
            .await?;
        Ok(Json(RecipeResponse { recipe }).into_response())
    }

    async fn macro_breakdown(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let request: DietRequest = parse_body(&body)?;
        let food_item = present(request.food_item)
            .ok_or_else(|| AppError::invalid_input("Food item is required"))?;

        let macro_breakdown = resources
            .food
            .macro_breakdown(&auth.user_id, &food_item)
            .await?;
        Ok(Json(DietResponse {
            food_item,
            macro_breakdown,
        })
        .into_response())
    }

    async fn diet_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let diet_history = resources.food.diet_history(&auth.user_id).await?;
        Ok(Json(DietHistoryResponse { diet_history }).into_response())
    }
}
