// ABOUTME: Environment configuration for the GlucoWise server: ports, store, identity, LLM, vision, classifier
// ABOUTME: Parsed once at startup from environment variables (with optional .env) and validated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Environment-based configuration management

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 5000;
/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
/// Default classifier artifact location
pub const DEFAULT_MODEL_PATH: &str = "./models/diabetes_forest.json";
/// Default Clarifai food recognition model
pub const DEFAULT_CLARIFAI_MODEL_URL: &str =
    "https://clarifai.com/clarifai/main/models/food-item-recognition";

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe document store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// File path
        path: PathBuf,
    },
    /// In-memory document store (tests and ephemeral runs)
    Memory,
}

impl DatabaseUrl {
    /// Parse a `DATABASE_URL` value; bare paths are treated as `SQLite` files
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path = s.strip_prefix("sqlite:").unwrap_or(s);
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path),
            }
        }
    }

    /// Convert to a sqlx connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/glucowise.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Firebase identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Firebase project ID (audience of ID tokens)
    pub project_id: Option<String>,
    /// Web API key used for Identity Toolkit sign-up and sign-in
    pub web_api_key: Option<String>,
    /// Whether ID-token verification is enabled
    pub enabled: bool,
    /// Fallback cache TTL for Google's signing certificates in seconds
    pub key_cache_ttl_secs: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            web_api_key: None,
            enabled: true,
            key_cache_ttl_secs: 3600,
        }
    }
}

impl FirebaseConfig {
    /// Check if token verification can run
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.enabled && self.project_id.is_some()
    }
}

/// Gemini LLM configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (`GEMINI_API_KEY`, legacy `PALM_API_KEY`)
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
}

/// Clarifai vision configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarifaiConfig {
    /// Personal access token
    pub pat: Option<String>,
    /// Model URL (`https://clarifai.com/{user}/{app}/models/{model}`)
    pub model_url: String,
}

/// Risk classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path of the JSON forest artifact
    pub model_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Request and history limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Chat turns replayed to the LLM and returned by the history endpoint
    pub chat_history_limit: usize,
    /// Diet queries returned by the history endpoint
    pub diet_history_limit: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Largest accepted request body (image uploads)
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            chat_history_limit: 10,
            diet_history_limit: 50,
            request_timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Document store location
    pub database_url: DatabaseUrl,
    /// Identity provider
    pub firebase: FirebaseConfig,
    /// Language model
    pub gemini: GeminiConfig,
    /// Food recognition
    pub clarifai: ClarifaiConfig,
    /// Risk classifier artifact
    pub classifier: ClassifierConfig,
    /// Request and history limits
    pub limits: LimitsConfig,
    /// Server version (from Cargo.toml)
    pub server_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            http_port: DEFAULT_HTTP_PORT,
            environment: Environment::Development,
            database_url: DatabaseUrl::default(),
            firebase: FirebaseConfig::default(),
            gemini: GeminiConfig {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_owned(),
            },
            clarifai: ClarifaiConfig {
                pat: None,
                model_url: DEFAULT_CLARIFAI_MODEL_URL.to_owned(),
            },
            classifier: ClassifierConfig::default(),
            limits: LimitsConfig::default(),
            server_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable cannot be parsed or a required
    /// credential is missing
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let defaults = LimitsConfig::default();
        let config = Self {
            host: env_var_or("HOST", "0.0.0.0"),
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database_url: env::var("DATABASE_URL")
                .map(|url| DatabaseUrl::parse_url(&url))
                .unwrap_or_default(),

            firebase: FirebaseConfig {
                project_id: non_empty_var("FIREBASE_PROJECT_ID"),
                web_api_key: non_empty_var("FIREBASE_WEB_API_KEY"),
                enabled: env_var_or("FIREBASE_ENABLED", "true")
                    .parse()
                    .context("Invalid FIREBASE_ENABLED value")?,
                key_cache_ttl_secs: env_var_or("FIREBASE_KEY_CACHE_TTL_SECS", "3600")
                    .parse()
                    .context("Invalid FIREBASE_KEY_CACHE_TTL_SECS value")?,
            },

            gemini: GeminiConfig {
                api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("PALM_API_KEY")),
                model: env_var_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            },

            clarifai: ClarifaiConfig {
                pat: non_empty_var("CLARIFAI_PAT"),
                model_url: env_var_or("CLARIFAI_MODEL_URL", DEFAULT_CLARIFAI_MODEL_URL),
            },

            classifier: ClassifierConfig {
                model_path: PathBuf::from(env_var_or("DIABETES_MODEL_PATH", DEFAULT_MODEL_PATH)),
            },

            limits: LimitsConfig {
                chat_history_limit: env_var_or(
                    "CHAT_HISTORY_LIMIT",
                    &defaults.chat_history_limit.to_string(),
                )
                .parse()
                .context("Invalid CHAT_HISTORY_LIMIT value")?,
                diet_history_limit: env_var_or(
                    "DIET_HISTORY_LIMIT",
                    &defaults.diet_history_limit.to_string(),
                )
                .parse()
                .context("Invalid DIET_HISTORY_LIMIT value")?,
                request_timeout_secs: env_var_or(
                    "REQUEST_TIMEOUT_SECS",
                    &defaults.request_timeout_secs.to_string(),
                )
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS value")?,
                max_upload_bytes: env_var_or(
                    "MAX_UPLOAD_BYTES",
                    &defaults.max_upload_bytes.to_string(),
                )
                .parse()
                .context("Invalid MAX_UPLOAD_BYTES value")?,
            },

            server_version: env!("CARGO_PKG_VERSION").to_owned(),
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error naming every missing credential, or for zero limits
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("FIREBASE_WEB_API_KEY", self.firebase.web_api_key.is_none()),
            ("GEMINI_API_KEY", self.gemini.api_key.is_none()),
            ("CLARIFAI_PAT", self.clarifai.pat.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(anyhow::anyhow!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ));
        }

        if self.firebase.enabled && self.firebase.project_id.is_none() {
            warn!("Firebase token verification is enabled but FIREBASE_PROJECT_ID is not set");
        }

        if self.limits.chat_history_limit == 0 || self.limits.diet_history_limit == 0 {
            return Err(anyhow::anyhow!("History limits must be greater than zero"));
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        let enabled = |flag: bool| if flag { "Enabled" } else { "Disabled" };
        format!(
            "GlucoWise Server Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - Firebase Auth: {}\n\
             - Gemini Model: {}\n\
             - Clarifai Model: {}\n\
             - Classifier Artifact: {}\n\
             - Chat History Limit: {}\n\
             - Diet History Limit: {}",
            self.host,
            self.http_port,
            self.environment,
            if self.database_url.is_memory() {
                "In-memory"
            } else {
                "SQLite"
            },
            enabled(self.firebase.is_configured()),
            self.gemini.model,
            self.clarifai.model_url,
            self.classifier.model_path.display(),
            self.limits.chat_history_limit,
            self.limits.diet_history_limit,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Environment variable treated as absent when blank
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_parsing() {
        assert_eq!(DatabaseUrl::parse_url("sqlite::memory:"), DatabaseUrl::Memory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/test.db").to_connection_string(),
            "sqlite:./data/test.db"
        );
        assert_eq!(
            DatabaseUrl::parse_url("plain.db"),
            DatabaseUrl::SQLite {
                path: PathBuf::from("plain.db")
            }
        );
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str_or_default("prod"), Environment::Production);
        assert_eq!(Environment::from_str_or_default("TEST"), Environment::Testing);
        assert_eq!(Environment::from_str_or_default("other"), Environment::Development);
    }

    #[test]
    fn test_validate_lists_missing_credentials() {
        let err = ServerConfig::default().validate().unwrap_err().to_string();
        assert!(err.contains("FIREBASE_WEB_API_KEY"));
        assert!(err.contains("GEMINI_API_KEY"));
        assert!(err.contains("CLARIFAI_PAT"));
    }
}
