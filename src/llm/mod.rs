// ABOUTME: Language model abstraction used for chat, diet plans, advice, recipes, and macro lookups
// ABOUTME: Defines the provider contract plus helpers for schema-constrained JSON generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # LLM Provider Interface
//!
//! Services talk to the hosted model through [`LlmProvider`]. Two call shapes are used:
//!
//! - **Chat**: a role-tagged message list, free-text answer
//! - **Structured output**: a single prompt plus a response schema; the provider is
//!   asked for `application/json` and the answer is parsed into typed records with
//!   [`generate_structured`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use glucowise_server::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::user("Is brown rice better than white rice for blood sugar?"),
//!     ]);
//!     let response = provider.complete(&request).await;
//! }
//! ```

mod gemini;
pub mod prompts;

pub use gemini::GeminiProvider;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// When set, the provider must answer with JSON matching this schema
    pub response_schema: Option<Value>,
}

impl ChatRequest {
    /// Create a new request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_schema: None,
        }
    }

    /// Require a JSON answer matching `schema`
    #[must_use]
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Response from a completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (STOP, MAX_TOKENS, ...)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Hosted language model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "gemini")
    fn name(&self) -> &'static str;

    /// Perform a completion
    ///
    /// # Errors
    ///
    /// Returns an external service error if the call fails or the answer is empty
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}

/// Ask for schema-constrained JSON and parse it into `T`
///
/// # Errors
///
/// Returns the provider's error, or an external service error if the answer does not
/// parse as `T`
pub async fn generate_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    prompt: String,
    schema: Value,
) -> AppResult<T> {
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_json_schema(schema);
    let response = provider.complete(&request).await?;
    parse_json_output(provider.name(), &response.content)
}

/// Parse model output as JSON, tolerating a surrounding Markdown code fence
///
/// # Errors
///
/// Returns an external service error if the text is not valid JSON for `T`
pub fn parse_json_output<T: DeserializeOwned>(service: &str, text: &str) -> AppResult<T> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim);

    serde_json::from_str(body).map_err(|e| {
        AppError::external_service(
            service.to_owned(),
            format!("Model returned malformed structured output: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_output_strips_code_fence() {
        let fenced = "```json\n[{\"nutrient\": \"Protein\", \"amount\": \"5g\"}]\n```";
        let parsed: Vec<crate::models::MacroBreakdown> = parse_json_output("gemini", fenced).unwrap();
        assert_eq!(parsed[0].nutrient, "Protein");

        let plain: Vec<u8> = parse_json_output("gemini", " [1, 2] ").unwrap();
        assert_eq!(plain, [1, 2]);
    }

    #[test]
    fn test_parse_json_output_reports_external_error() {
        let err = parse_json_output::<Vec<u8>>("gemini", "Sorry, I can't help").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::ExternalServiceError);
    }
}
