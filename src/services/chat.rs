// ABOUTME: Assistant chat backed by the hosted model with a rolling window of stored turns
// ABOUTME: History is read newest-first from the store and reversed into conversation order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{recent_records, to_body};
use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;
use crate::models::ChatTurn;
use crate::store::{collections, timestamp, DocumentStore};

/// One turn as shown to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    /// User message
    pub message: String,
    /// Assistant reply
    pub response: String,
    /// When the turn completed
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl From<ChatTurn> for ChatHistoryEntry {
    fn from(turn: ChatTurn) -> Self {
        Self {
            message: turn.message,
            response: turn.response,
            timestamp: turn.timestamp,
        }
    }
}

/// Chat with the diabetes-care assistant
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmProvider>,
    history_limit: usize,
    logger: AppLogger,
}

impl ChatService {
    /// Create the service; `history_limit` turns are replayed as model context
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmProvider>,
        history_limit: usize,
        logger: AppLogger,
    ) -> Self {
        Self {
            store,
            llm,
            history_limit,
            logger,
        }
    }

    /// The last `history_limit` turns in chronological order
    async fn window(&self, user_id: &str) -> AppResult<Vec<ChatTurn>> {
        let mut turns: Vec<ChatTurn> = recent_records(
            self.store.as_ref(),
            collections::CHAT_HISTORY,
            user_id,
            self.history_limit,
        )
        .await?
        .into_iter()
        .map(|(_, turn)| turn)
        .collect();
        turns.reverse();
        Ok(turns)
    }

    /// Build the model conversation: system prompt, prior turns, new message
    fn conversation(history: &[ChatTurn], message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        messages.push(ChatMessage::system(prompts::chat_system_prompt()));
        for turn in history {
            messages.push(ChatMessage::user(&turn.message));
            messages.push(ChatMessage::assistant(&turn.response));
        }
        messages.push(ChatMessage::user(message));
        messages
    }

    /// Send a message and store the completed turn
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` ("Message is required") for a blank message, or the
    /// model's error
    #[instrument(skip(self, message), fields(user.id = %user_id))]
    pub async fn send(&self, user_id: &str, message: &str) -> AppResult<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message is required"));
        }

        let history = self.window(user_id).await?;
        debug!(
            parent: self.logger.span(),
            user.id = %user_id,
            history_turns = history.len(),
            "Replaying chat history"
        );

        let request = ChatRequest::new(Self::conversation(&history, message));
        let reply = self.llm.complete(&request).await?.content;

        let turn = ChatTurn {
            user_id: user_id.to_owned(),
            message: message.to_owned(),
            response: reply.clone(),
            timestamp: Utc::now(),
        };
        self.store
            .add(collections::CHAT_HISTORY, to_body(&turn)?)
            .await?;

        info!(
            parent: self.logger.span(),
            user.id = %user_id,
            response_length = reply.len(),
            "Chat processed"
        );
        Ok(reply)
    }

    /// Recent turns in chronological order
    ///
    /// # Errors
    ///
    /// Returns a database error if the store read fails
    pub async fn history(&self, user_id: &str) -> AppResult<Vec<ChatHistoryEntry>> {
        Ok(self
            .window(user_id)
            .await?
            .into_iter()
            .map(ChatHistoryEntry::from)
            .collect())
    }

    /// Delete every stored turn for the user, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn clear(&self, user_id: &str) -> AppResult<u64> {
        let deleted = self
            .store
            .delete_where(
                collections::CHAT_HISTORY,
                "user_id",
                &Value::String(user_id.to_owned()),
            )
            .await?;
        info!(parent: self.logger.span(), user.id = %user_id, deleted, "Chat history cleared");
        Ok(deleted)
    }
}
