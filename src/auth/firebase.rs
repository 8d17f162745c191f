// ABOUTME: Firebase ID-token verification using Google's rotating x509 signing certificates
// ABOUTME: Certificates are cached for the Cache-Control max-age and refreshed on expiry or unknown kid
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Firebase ID Token Verification
//!
//! - RS256 signature checked against the certificate named by the token's `kid`
//! - issuer must be `https://securetoken.google.com/<project-id>`, audience the project ID
//! - expiry enforced by `jsonwebtoken`
//! - certificates cached for the `max-age` Google returns (never less than five minutes)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

use super::{AuthenticatedUser, TokenVerifier};
use crate::config::FirebaseConfig;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Google's Firebase signing certificate endpoint
const FIREBASE_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Firebase issuer prefix (followed by the project ID)
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Minimum cache TTL in seconds
const MIN_CACHE_TTL_SECS: i64 = 300;

struct CachedKeys {
    /// Key ID to PEM-encoded public key
    keys: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

/// Claims carried by a Firebase ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// Issuer
    pub iss: String,
    /// Audience (Firebase project ID)
    pub aud: String,
    /// Subject (Firebase UID)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Email, if the account has one
    pub email: Option<String>,
    /// Firebase-specific claims
    #[serde(default)]
    pub firebase: FirebaseSpecificClaims,
}

/// Nested `firebase` claim
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseSpecificClaims {
    /// Sign-in provider (`password`, `google.com`, ...)
    pub sign_in_provider: Option<String>,
}

/// Firebase ID-token verifier with a shared certificate cache
pub struct FirebaseAuth {
    config: FirebaseConfig,
    http_client: Client,
    cached_keys: Arc<RwLock<Option<CachedKeys>>>,
    logger: AppLogger,
}

impl FirebaseAuth {
    /// Create a verifier
    #[must_use]
    pub fn new(config: FirebaseConfig, http_client: Client, logger: AppLogger) -> Self {
        Self {
            config,
            http_client,
            cached_keys: Arc::new(RwLock::new(None)),
            logger,
        }
    }

    /// Check if verification is enabled and configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Validate a Firebase ID token
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Firebase is not configured or disabled
    /// - the header cannot be decoded or has no key ID
    /// - no certificate matches the key ID
    /// - the signature, expiry, issuer, or audience check fails
    pub async fn validate_token(&self, token: &str) -> AppResult<FirebaseClaims> {
        let project_id = self
            .config
            .project_id
            .as_ref()
            .ok_or_else(|| AppError::config("Firebase authentication is not configured"))?;

        if !self.config.enabled {
            return Err(AppError::config("Firebase authentication is disabled"));
        }

        let header = decode_header(token).map_err(|e| {
            debug!(parent: self.logger.span(), error = %e, "Failed to decode Firebase token header");
            AppError::auth_invalid("Invalid token format")
        })?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::auth_invalid("Token missing key ID"))?;

        let pem_key = self.get_public_key(&kid).await?;

        let decoding_key = DecodingKey::from_rsa_pem(pem_key.as_bytes()).map_err(|e| {
            warn!(parent: self.logger.span(), error = %e, kid = %kid, "Failed to create decoding key from PEM");
            AppError::internal(format!("Invalid public key: {e}"))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("{FIREBASE_ISSUER_PREFIX}{project_id}")]);

        let token_data =
            decode::<FirebaseClaims>(token, &decoding_key, &validation).map_err(|e| {
                debug!(parent: self.logger.span(), error = %e, "Firebase token validation failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::auth_expired(),
                    ErrorKind::InvalidAudience => AppError::auth_invalid("Invalid token audience"),
                    ErrorKind::InvalidIssuer => AppError::auth_invalid("Invalid token issuer"),
                    _ => AppError::auth_invalid("Invalid ID token"),
                }
            })?;

        Ok(token_data.claims)
    }

    async fn get_public_key(&self, kid: &str) -> AppResult<String> {
        if let Some(key) = self.try_get_cached_key(kid).await {
            return Ok(key);
        }

        self.refresh_keys().await?;

        let key = {
            let cache = self.cached_keys.read().await;
            cache.as_ref().and_then(|cached| cached.keys.get(kid).cloned())
        };
        key.ok_or_else(|| AppError::auth_invalid("Unknown token signing key"))
    }

    async fn try_get_cached_key(&self, kid: &str) -> Option<String> {
        let key = {
            let cache = self.cached_keys.read().await;
            cache
                .as_ref()
                .filter(|cached| cached.expires_at > Utc::now())
                .and_then(|cached| cached.keys.get(kid).cloned())
        };
        key
    }

    async fn refresh_keys(&self) -> AppResult<()> {
        info!(parent: self.logger.span(), "Fetching Firebase public keys from Google");
        let started = std::time::Instant::now();

        let response = self
            .http_client
            .get(FIREBASE_CERTS_URL)
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("firebase", e.to_string()))?;

        let fallback_ttl = i64::try_from(self.config.key_cache_ttl_secs).unwrap_or(i64::MAX);
        let cache_ttl = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(fallback_ttl)
            .max(MIN_CACHE_TTL_SECS);

        let certs: HashMap<String, String> = response.json().await.map_err(|e| {
            AppError::external_service("firebase", format!("Failed to parse public keys: {e}"))
        })?;

        let keys = convert_certs_to_keys(certs, &self.logger)?;
        let expires_at = Utc::now() + Duration::seconds(cache_ttl);
        self.logger.log_external_call(
            "firebase",
            "fetch_certificates",
            true,
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        debug!(
            parent: self.logger.span(),
            num_keys = keys.len(),
            cache_ttl_secs = cache_ttl,
            "Firebase public keys cached"
        );

        *self.cached_keys.write().await = Some(CachedKeys { keys, expires_at });
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for FirebaseAuth {
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let claims = self.validate_token(token).await?;
        let user = AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
            provider: claims
                .firebase
                .sign_in_provider
                .unwrap_or_else(|| "unknown".to_owned()),
        };
        self.logger.log_auth_event(&user.user_id, "verify_id_token", true);
        Ok(user)
    }
}

fn convert_certs_to_keys(
    certs: HashMap<String, String>,
    logger: &AppLogger,
) -> AppResult<HashMap<String, String>> {
    let mut keys = HashMap::with_capacity(certs.len());
    for (kid, cert_pem) in certs {
        match extract_public_key_from_cert(&cert_pem) {
            Ok(public_key_pem) => {
                keys.insert(kid, public_key_pem);
            }
            Err(e) => {
                warn!(parent: logger.span(), kid = %kid, error = %e, "Failed to extract public key from certificate");
            }
        }
    }

    if keys.is_empty() {
        return Err(AppError::external_service(
            "firebase",
            "No valid Firebase public keys found",
        ));
    }
    Ok(keys)
}

/// Parse the `max-age` directive of a Cache-Control header
///
/// `"public, max-age=3600, must-revalidate"` yields `3600`.
#[must_use]
pub fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|s| s.strip_prefix("max-age="))
        .and_then(|s| s.parse().ok())
}

/// PEM-encode the subject public key of an x509 certificate
fn extract_public_key_from_cert(cert_pem: &str) -> AppResult<String> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to parse X.509 PEM: {e}")))?;

    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| AppError::internal(format!("Failed to parse X.509 certificate: {e}")))?;

    let encoded = STANDARD.encode(cert.public_key().raw);
    let body = encoded
        .as_bytes()
        .chunks(64)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "-----BEGIN PUBLIC KEY-----\n{body}\n-----END PUBLIC KEY-----"
    ))
}
