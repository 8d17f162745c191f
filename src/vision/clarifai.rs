// ABOUTME: Clarifai model outputs client that uploads a base64 image and reads the top concept
// ABOUTME: Model coordinates (user, app, model) are parsed from the public model URL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{FoodConcept, FoodRecognizer};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;

/// Clarifai API root
const API_BASE_URL: &str = "https://api.clarifai.com/v2";

/// Clarifai status code for success
const STATUS_SUCCESS: u32 = 10_000;

const SERVICE: &str = "clarifai";

/// Model coordinates within Clarifai
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarifaiModelRef {
    /// Owning user
    pub user_id: String,
    /// Application
    pub app_id: String,
    /// Model
    pub model_id: String,
}

impl ClarifaiModelRef {
    /// Parse `https://clarifai.com/{user}/{app}/models/{model}`
    ///
    /// # Errors
    ///
    /// Returns a config error if the URL does not have that shape
    pub fn parse(model_url: &str) -> AppResult<Self> {
        let path = model_url
            .split_once("://")
            .map_or(model_url, |(_, rest)| rest)
            .split_once('/')
            .map(|(_, path)| path)
            .unwrap_or_default();

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [user_id, app_id, "models", model_id, ..] => Ok(Self {
                user_id: (*user_id).to_owned(),
                app_id: (*app_id).to_owned(),
                model_id: (*model_id).to_owned(),
            }),
            _ => Err(AppError::config(format!(
                "CLARIFAI_MODEL_URL must look like https://clarifai.com/<user>/<app>/models/<model>, got {model_url}"
            ))),
        }
    }
}

#[derive(Serialize)]
struct OutputsRequest {
    inputs: Vec<Input>,
}

#[derive(Serialize)]
struct Input {
    data: InputData,
}

#[derive(Serialize)]
struct InputData {
    image: ImagePayload,
}

#[derive(Serialize)]
struct ImagePayload {
    base64: String,
}

#[derive(Deserialize)]
struct OutputsResponse {
    status: Status,
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Deserialize)]
struct Status {
    code: u32,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    data: Option<OutputData>,
}

#[derive(Deserialize)]
struct OutputData {
    #[serde(default)]
    concepts: Vec<Concept>,
}

#[derive(Deserialize)]
struct Concept {
    name: String,
    value: f64,
}

/// Clarifai-backed [`FoodRecognizer`]
pub struct ClarifaiRecognizer {
    pat: String,
    model: ClarifaiModelRef,
    base_url: String,
    http_client: Client,
    logger: AppLogger,
}

impl fmt::Debug for ClarifaiRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClarifaiRecognizer")
            .field("model", &self.model)
            .field("pat", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ClarifaiRecognizer {
    /// Create a recognizer for the model at `model_url`
    ///
    /// # Errors
    ///
    /// Returns a config error for a malformed model URL
    pub fn new(
        pat: impl Into<String>,
        model_url: &str,
        http_client: Client,
        logger: AppLogger,
    ) -> AppResult<Self> {
        Ok(Self {
            pat: pat.into(),
            model: ClarifaiModelRef::parse(model_url)?,
            base_url: API_BASE_URL.to_owned(),
            http_client,
            logger,
        })
    }

    /// Point the client at a different API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn outputs_url(&self) -> String {
        format!(
            "{}/users/{}/apps/{}/models/{}/outputs",
            self.base_url, self.model.user_id, self.model.app_id, self.model.model_id
        )
    }

    fn top_concept(response: OutputsResponse) -> Option<FoodConcept> {
        response
            .outputs
            .into_iter()
            .next()
            .and_then(|output| output.data)
            .and_then(|data| data.concepts.into_iter().next())
            .map(|concept| FoodConcept {
                name: concept.name,
                confidence: concept.value,
            })
    }
}

#[async_trait]
impl FoodRecognizer for ClarifaiRecognizer {
    #[instrument(skip(self, image), fields(service = SERVICE, image_bytes = image.len()))]
    async fn recognize(&self, image: &[u8]) -> AppResult<Option<FoodConcept>> {
        let body = OutputsRequest {
            inputs: vec![Input {
                data: InputData {
                    image: ImagePayload {
                        base64: STANDARD.encode(image),
                    },
                },
            }],
        };

        let started = Instant::now();
        let response = self
            .http_client
            .post(self.outputs_url())
            .header("Authorization", format!("Key {}", self.pat))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, e.to_string()))?;

        let status = response.status();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.logger
            .log_external_call(SERVICE, "model_outputs", status.is_success(), elapsed);

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::new(
                ErrorCode::ExternalAuthFailed,
                "Clarifai rejected the personal access token",
            ));
        }
        if status.as_u16() == 429 {
            return Err(AppError::new(
                ErrorCode::ExternalRateLimited,
                "Food recognition is rate limited, try again shortly",
            ));
        }

        let parsed: OutputsResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("Unexpected response ({status}): {e}"))
        })?;

        if parsed.status.code != STATUS_SUCCESS {
            return Err(AppError::external_service(
                SERVICE,
                format!(
                    "Prediction failed ({}): {}",
                    parsed.status.code, parsed.status.description
                ),
            ));
        }

        let concept = Self::top_concept(parsed);
        debug!(
            parent: self.logger.span(),
            food = concept.as_ref().map_or("none", |c| c.name.as_str()),
            "Food recognition completed"
        );
        Ok(concept)
    }
}
