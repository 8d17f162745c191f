// ABOUTME: Authentication seams: ID-token verification and email/password identity operations
// ABOUTME: Route handlers depend on these traits so tests can substitute in-process fakes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Authentication
//!
//! Credential issuance is delegated to Firebase. This module only:
//!
//! - verifies `Authorization: Bearer <ID token>` headers ([`TokenVerifier`])
//! - forwards email/password sign-up and sign-in to Identity Toolkit ([`IdentityProvider`])

/// Firebase ID-token verification against Google's signing certificates
pub mod firebase;

/// Identity Toolkit REST client for sign-up and sign-in
pub mod identity;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub use firebase::{FirebaseAuth, FirebaseClaims};
pub use identity::{FirebaseIdentityClient, IDENTITY_TOOLKIT_BASE_URL};

/// Identity established from a verified ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider user ID (Firebase UID)
    pub user_id: String,
    /// Email claim, when present
    pub email: Option<String>,
    /// Sign-in provider (`password`, `google.com`, ...)
    pub provider: String,
}

/// Verifies bearer tokens
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify an ID token and return the user it belongs to
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` or `AuthExpired` for rejected tokens
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser>;
}

/// Tokens returned after a successful sign-up or sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Provider user ID
    pub user_id: String,
    /// Short-lived ID token for `Authorization: Bearer`
    pub id_token: String,
    /// Refresh token
    pub refresh_token: String,
    /// ID token lifetime in seconds
    pub expires_in: u64,
}

/// Email/password account operations at the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or an external service error
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<AuthSession>;

    /// Exchange credentials for tokens
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for wrong credentials, or an external service error
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession>;
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// # Errors
///
/// Returns `AuthRequired` when the header is missing and `AuthInvalid` when it is not a
/// bearer credential
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(AppError::auth_required)?
        .to_str()
        .map_err(|_| AppError::auth_invalid("Authorization token missing or invalid"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::auth_invalid("Authorization token missing or invalid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            bearer_token(&headers).unwrap_err().code,
            crate::errors::ErrorCode::AuthRequired
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(
            bearer_token(&headers).unwrap_err().code,
            crate::errors::ErrorCode::AuthInvalid
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token-123"));
        assert_eq!(bearer_token(&headers).unwrap(), "token-123");
    }
}
