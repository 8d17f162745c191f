// ABOUTME: Account, profile and chat route handlers under /api/user
// ABOUTME: Sign-up and login go through the identity provider; everything else needs a bearer token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! User routes
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST | `/api/user/createUser` | bearer |
//! | POST | `/api/user/signup` | none |
//! | POST | `/api/user/login` | none |
//! | GET, POST | `/api/user/` | bearer |
//! | POST | `/api/user/chat` | bearer |
//! | GET, DELETE | `/api/user/chat/history` | bearer |
//! | GET, PUT | `/api/user/profile` | bearer |

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{authenticate, parse_body, present};
use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::{ChatHistoryEntry, UpdatedFields};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/user/createUser`
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    /// Account email
    pub email: Option<String>,
    /// Display name
    pub display_name: Option<String>,
}

/// Body of `POST /api/user/signup` and `POST /api/user/login`
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    /// Account email
    pub email: Option<String>,
    /// Account password
    pub password: Option<String>,
    /// Display name (sign-up only)
    pub display_name: Option<String>,
}

/// Response for account creation
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedUserResponse {
    /// Confirmation text
    pub message: String,
    /// Provider user ID
    pub user_id: String,
}

/// Response for sign-up and login
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Confirmation text
    pub message: String,
    /// Provider user ID
    pub user_id: String,
    /// ID token for `Authorization: Bearer`
    pub id_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// ID token lifetime in seconds
    pub expires_in: u64,
}

impl SessionResponse {
    fn new(message: &str, session: AuthSession) -> Self {
        Self {
            message: message.to_owned(),
            user_id: session.user_id,
            id_token: session.id_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
        }
    }
}

/// Body of `POST /api/user/chat`
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequestBody {
    /// The user's message
    #[serde(rename = "newMessage")]
    pub new_message: Option<String>,
}

/// Response for a chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReplyResponse {
    /// Assistant reply
    pub response: String,
    /// Caller
    pub user_id: String,
}

/// Response for chat history
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    /// Turns in chronological order
    pub history: Vec<ChatHistoryEntry>,
}

/// Response for operations that only confirm
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Confirmation text
    pub message: String,
}

// ============================================================================
// User Routes
// ============================================================================

/// User routes handler
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            // Accounts
            .route("/api/user/createUser", post(Self::create_user))
            .route("/api/user/signup", post(Self::signup))
            .route("/api/user/login", post(Self::login))
            .route("/api/user", get(Self::get_user).post(Self::update_user))
            .route("/api/user/", get(Self::get_user).post(Self::update_user))
            // Chat
            .route("/api/user/chat", post(Self::chat))
            .route(
                "/api/user/chat/history",
                get(Self::chat_history).delete(Self::delete_chat_history),
            )
            // Profile
            .route(
                "/api/user/profile",
                get(Self::get_profile).put(Self::update_profile),
            )
            .with_state(resources)
    }

    // ========================================================================
    // Account Handlers
    // ========================================================================

    /// Create the user document for an account registered client-side
    async fn create_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let request: CreateUserRequest = parse_body(&body)?;
        let email = present(request.email)
            .or(auth.email)
            .ok_or_else(|| AppError::invalid_input("Email is required"))?;

        resources
            .profiles
            .create_user(&auth.user_id, &email, present(request.display_name))
            .await?;

        Ok((
            StatusCode::CREATED,
            Json(CreatedUserResponse {
                message: "User created successfully".to_owned(),
                user_id: auth.user_id,
            }),
        )
            .into_response())
    }

    /// Register with email and password, then create the user document
    async fn signup(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: CredentialsRequest = parse_body(&body)?;
        let (Some(email), Some(password)) = (present(request.email), present(request.password))
        else {
            return Err(AppError::invalid_input("Email and password are required"));
        };
        let display_name = present(request.display_name);

        let session = resources
            .identity
            .sign_up(&email, &password, display_name.as_deref())
            .await?;
        resources
            .profiles
            .create_user(&session.user_id, &email, display_name)
            .await?;
        resources
            .logger
            .log_auth_event(&session.user_id, "signup", true);

        Ok((
            StatusCode::CREATED,
            Json(SessionResponse::new("User created successfully", session)),
        )
            .into_response())
    }

    /// Sign in with email and password
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let request: CredentialsRequest = parse_body(&body)?;
        let (Some(email), Some(password)) = (present(request.email), present(request.password))
        else {
            return Err(AppError::invalid_input("Email and password are required"));
        };

        let session = resources.identity.sign_in(&email, &password).await?;
        resources
            .profiles
            .record_login(&session.user_id, &email)
            .await?;

        Ok(Json(SessionResponse::new("Login successful", session)).into_response())
    }

    /// The caller's user document
    async fn get_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let user = resources.profiles.get_user(&auth.user_id).await?;
        Ok(Json(user).into_response())
    }

    /// Partially update the caller's user document
    async fn update_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let update: Value = parse_body(&body)?;
        let result: UpdatedFields = resources
            .profiles
            .update_user(&auth.user_id, update)
            .await?;
        Ok(Json(result).into_response())
    }

    // ========================================================================
    // Chat Handlers
    // ========================================================================

    /// Send a message to the assistant
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let request: ChatRequestBody = parse_body(&body)?;
        let message = present(request.new_message)
            .ok_or_else(|| AppError::invalid_input("Message is required"))?;

        let response = resources.chat.send(&auth.user_id, &message).await?;
        Ok(Json(ChatReplyResponse {
            response,
            user_id: auth.user_id,
        })
        .into_response())
    }

    /// Recent chat turns, oldest first
    async fn chat_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let history = resources.chat.history(&auth.user_id).await?;
        Ok(Json(ChatHistoryResponse { history }).into_response())
    }

    /// Delete the caller's chat history
    async fn delete_chat_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        resources.chat.clear(&auth.user_id).await?;
        Ok(Json(MessageResponse {
            message: "Chat history deleted successfully".to_owned(),
        })
        .into_response())
    }

    // ========================================================================
    // Profile Handlers
    // ========================================================================

    /// The caller's profile
    async fn get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let profile = resources.profiles.get_profile(&auth.user_id).await?;
        Ok(Json(profile).into_response())
    }

    /// Partially update the caller's profile
    async fn update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let update: Value = parse_body(&body)?;
        let updated_fields = resources
            .profiles
            .update_profile(&auth.user_id, update)
            .await?;
        Ok(Json(UpdatedFields {
            message: "Profile updated successfully".to_owned(),
            updated_fields,
        })
        .into_response())
    }
}
