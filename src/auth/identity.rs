// ABOUTME: Identity Toolkit REST client for Firebase email/password sign-up and sign-in
// ABOUTME: Maps provider error codes (EMAIL_EXISTS, INVALID_PASSWORD, ...) onto AppError codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{AuthSession, IdentityProvider};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;

/// Identity Toolkit v1 API base
pub const IDENTITY_TOOLKIT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase Identity Toolkit client
pub struct FirebaseIdentityClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    logger: AppLogger,
}

impl std::fmt::Debug for FirebaseIdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentityClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl FirebaseIdentityClient {
    /// Create a client for the public Identity Toolkit endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>, http_client: Client, logger: AppLogger) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: IDENTITY_TOOLKIT_BASE_URL.to_owned(),
            http_client,
            logger,
        }
    }

    /// Point the client at a different base URL (emulator or test server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{method}?key={}", self.base_url, self.api_key)
    }

    async fn call(&self, method: &str, body: &PasswordRequest<'_>) -> AppResult<AuthSession> {
        let started = Instant::now();
        let response = self
            .http_client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("identity_toolkit", e.to_string()))?;

        let status = response.status();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.logger
            .log_external_call("identity_toolkit", method, status.is_success(), elapsed);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(map_identity_error(&code));
        }

        let parsed: PasswordResponse = response.json().await.map_err(|e| {
            AppError::external_service("identity_toolkit", format!("Unexpected response: {e}"))
        })?;

        Ok(AuthSession {
            user_id: parsed.local_id,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_in: parsed
                .expires_in
                .and_then(|secs| secs.parse().ok())
                .unwrap_or(3600),
        })
    }
}

/// Map an Identity Toolkit error message onto an application error
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be at least 6 characters`.
#[must_use]
pub fn map_identity_error(message: &str) -> AppError {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AppError::new(
            ErrorCode::ResourceAlreadyExists,
            "An account with this email already exists",
        ),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AppError::auth_invalid("Invalid email or password")
        }
        "WEAK_PASSWORD" | "INVALID_EMAIL" | "MISSING_PASSWORD" | "MISSING_EMAIL" => {
            AppError::invalid_input(message.to_owned())
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AppError::new(
            ErrorCode::ExternalRateLimited,
            "Too many sign-in attempts, try again later",
        ),
        _ => AppError::external_service("identity_toolkit", message.to_owned()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    #[instrument(skip(self, password), fields(service = "identity_toolkit"))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<AuthSession> {
        let session = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    display_name,
                    return_secure_token: true,
                },
            )
            .await?;
        self.logger.log_auth_event(&session.user_id, "sign_up", true);
        Ok(session)
    }

    #[instrument(skip(self, password), fields(service = "identity_toolkit"))]
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let session = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    display_name: None,
                    return_secure_token: true,
                },
            )
            .await?;
        self.logger.log_auth_event(&session.user_id, "sign_in", true);
        Ok(session)
    }
}
