// ABOUTME: Google Gemini provider over the Generative Language REST API (generateContent)
// ABOUTME: Supports chat history, system instructions, and JSON output constrained by a response schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Gemini Provider
//!
//! Implementation of [`LlmProvider`] for Google's Gemini models.
//!
//! ## Configuration
//!
//! `GEMINI_API_KEY` (or the legacy `PALM_API_KEY`) and `GEMINI_MODEL`
//! (default `gemini-2.0-flash`).
//!
//! Structured output sets `response_mime_type: application/json` and passes the
//! request's schema as `response_schema`.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, MessageRole, TokenUsage};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Service name used in errors and logs
const SERVICE: &str = "gemini";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: Client,
    default_model: String,
    logger: AppLogger,
}

impl GeminiProvider {
    /// Create a provider
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        default_model: impl Into<String>,
        client: Client,
        logger: AppLogger,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_owned(),
            client,
            default_model: default_model.into(),
            logger,
        }
    }

    /// Point the provider at a different API root (test server or proxy)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Convert our message role to Gemini's role format
    ///
    /// System messages normally travel in `system_instruction`; a stray one is sent as user.
    const fn convert_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }

    fn build_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}?key={}", self.base_url, self.api_key)
    }

    fn convert_messages(messages: &[ChatMessage]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut contents = Vec::with_capacity(messages.len());
        let mut system_instruction = None;

        for message in messages {
            let part = ContentPart {
                text: message.content.clone(),
            };
            if message.role == MessageRole::System {
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![part],
                });
            } else {
                contents.push(GeminiContent {
                    role: Some(Self::convert_role(message.role).to_owned()),
                    parts: vec![part],
                });
            }
        }

        (contents, system_instruction)
    }

    fn build_gemini_request(request: &ChatRequest) -> GeminiRequest {
        let (contents, system_instruction) = Self::convert_messages(&request.messages);

        let generation_config = request
            .response_schema
            .as_ref()
            .map(|schema| GenerationConfig {
                candidate_count: Some(1),
                response_mime_type: Some("application/json"),
                response_schema: Some(schema.clone()),
            });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    /// Concatenate the text parts of the first candidate
    fn extract_content(response: &GeminiResponse) -> AppResult<String> {
        let candidate = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or_else(|| AppError::external_service(SERVICE, "No candidates in Gemini response"))?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
            return Err(AppError::external_service(
                SERVICE,
                format!("Gemini returned no text (finish reason: {reason})"),
            ));
        }
        Ok(text)
    }

    fn convert_usage(metadata: &UsageMetadata) -> TokenUsage {
        TokenUsage {
            prompt_tokens: metadata.prompt.unwrap_or(0),
            completion_tokens: metadata.candidates.unwrap_or(0),
            total_tokens: metadata.total.unwrap_or(0),
        }
    }

    /// Map API error status to appropriate error type
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);

        match status {
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                Self::extract_quota_message(&message),
            ),
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("Gemini rejected the API key: {message}"),
            ),
            _ => AppError::external_service(SERVICE, format!("Gemini API error ({status}): {message}")),
        }
    }

    /// Turn "... Please retry in 6.4s." into a whole-second hint
    fn extract_quota_message(message: &str) -> String {
        let seconds = message
            .split_once("Please retry in ")
            .and_then(|(_, rest)| rest.split_once('s'))
            .and_then(|(value, _)| value.parse::<f64>().ok());

        seconds.map_or_else(
            || "AI service quota exceeded. Please wait a moment and try again.".to_owned(),
            |secs| {
                let whole = secs.ceil() as u64;
                format!("AI service quota exceeded. Please try again in {whole} seconds.")
            },
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        SERVICE
    }

    #[instrument(skip(self, request), fields(model = %self.default_model, structured = request.response_schema.is_some()))]
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = self.default_model.as_str();
        let url = self.build_url(model, "generateContent");
        let gemini_request = Self::build_gemini_request(request);
        let started = Instant::now();

        debug!(parent: self.logger.span(), messages = request.messages.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            AppError::external_unavailable(SERVICE, format!("Failed to read response: {e}"))
        })?;

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.logger
            .log_external_call(SERVICE, "generateContent", status.is_success(), elapsed);

        if !status.is_success() {
            error!(parent: self.logger.span(), status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(parent: self.logger.span(), error = %e, "Failed to parse Gemini response");
            AppError::external_service(SERVICE, format!("Failed to parse Gemini response: {e}"))
        })?;

        if let Some(error) = gemini_response.error {
            return Err(AppError::external_service(
                SERVICE,
                format!("Gemini API error: {}", error.message),
            ));
        }

        let content = Self::extract_content(&gemini_response)?;
        let usage = gemini_response
            .usage_metadata
            .as_ref()
            .map(Self::convert_usage);
        let finish_reason = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            usage,
            finish_reason,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
