// ABOUTME: Shared test utilities and fakes for integration tests
// ABOUTME: In-process identity, model, vision and classifier doubles over an in-memory store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `glucowise_server`

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use glucowise_intelligence::{BinaryClassifier, MetricsConfig, ModelError};
use glucowise_server::{
    auth::{AuthSession, AuthenticatedUser, IdentityProvider, TokenVerifier},
    config::{DatabaseUrl, ServerConfig},
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, LlmProvider, MessageRole},
    logging::AppLogger,
    resources::{ExternalServices, ServerResources},
    server::build_router,
    store::{DocumentStore, MemoryDocumentStore},
    vision::{FoodConcept, FoodRecognizer},
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

/// Complete profile for a 30-year-old, 70 kg, 175 cm sedentary male
pub fn complete_profile() -> Value {
    json!({
        "age": 30,
        "sex": "Male",
        "height": 175,
        "weight": 70,
        "activity_level": "Sedentary",
        "goal": "maintain",
        "race": "Asian",
        "smoking_history": "never",
        "location": "Ohio",
        "hypertension": "No",
        "heart_disease": "No",
        "hba1c": 5.4,
        "blood_glucose": 95
    })
}

/// Bearer token the fake verifier accepts for `user_id`
pub fn token_for(user_id: &str) -> String {
    format!("test-token-{user_id}")
}

// ============================================================================
// Fakes
// ============================================================================

/// Accepts `test-token-<uid>` and rejects everything else
pub struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let user_id = token
            .strip_prefix("test-token-")
            .ok_or_else(|| AppError::auth_invalid("Invalid ID token"))?;
        Ok(AuthenticatedUser {
            user_id: user_id.to_owned(),
            email: Some(format!("{user_id}@example.com")),
            provider: "password".to_owned(),
        })
    }
}

/// Derives the user ID from the email's local part; password `wrong` fails sign-in
pub struct FakeIdentity;

impl FakeIdentity {
    fn session(email: &str) -> AuthSession {
        let user_id = email.split('@').next().unwrap_or(email).to_owned();
        AuthSession {
            id_token: token_for(&user_id),
            refresh_token: format!("refresh-{user_id}"),
            expires_in: 3600,
            user_id,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        _display_name: Option<&str>,
    ) -> AppResult<AuthSession> {
        Ok(Self::session(email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        if password == "wrong" {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }
        Ok(Self::session(email))
    }
}

/// Answers structured requests with canned JSON chosen by schema, and chat by echo
#[derive(Default)]
pub struct ScriptedLlm {
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    /// Every request received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn structured_answer(schema: &Value) -> Value {
        let properties = &schema["items"]["properties"];
        if properties.get("mealtime").is_some() {
            json!([
                {"mealtime": "Breakfast", "foodItem": "Steel-cut oats", "calories": 350, "protein": 12, "carbs": 55, "fat": 8},
                {"mealtime": "Dinner", "foodItem": "Grilled salmon", "calories": 550, "protein": 40, "carbs": 20, "fat": 30}
            ])
        } else if properties.get("recipeName").is_some() {
            json!([
                {"recipeName": "Cauliflower crust pizza", "calories": 420, "protein": 25, "fats": 18, "carbs": 30, "ingredients": "cauliflower, egg, mozzarella, tomato"}
            ])
        } else if properties.get("nutrient").is_some() {
            json!([
                {"nutrient": "Protein", "amount": "1.3g"},
                {"nutrient": "Carbohydrates", "amount": "27g"}
            ])
        } else {
            json!([
                {
                    "general_recommendations": "Keep meals regular.",
                    "exercise_suggestions": "Walk 30 minutes daily.",
                    "dietary_advice": "Prefer whole grains.",
                    "health_risks": "Low at current weight.",
                    "lifestyle_tips": "Sleep 7-8 hours."
                }
            ])
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let content = match &request.response_schema {
            Some(schema) => Self::structured_answer(schema).to_string(),
            None => {
                let last = request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == MessageRole::User)
                    .map_or("", |m| m.content.as_str());
                format!("echo: {last}")
            }
        };

        Ok(ChatResponse {
            content,
            model: "scripted-model".to_owned(),
            usage: None,
            finish_reason: Some("STOP".to_owned()),
        })
    }
}

/// Always recognizes the same concept (or nothing)
pub struct FixedRecognizer(pub Option<FoodConcept>);

#[async_trait]
impl FoodRecognizer for FixedRecognizer {
    async fn recognize(&self, _image: &[u8]) -> AppResult<Option<FoodConcept>> {
        Ok(self.0.clone())
    }
}

/// Always predicts the same label and remembers the last feature row
pub struct FixedClassifier {
    label: u8,
    last_row: Mutex<Vec<f64>>,
}

impl FixedClassifier {
    pub fn new(label: u8) -> Self {
        Self {
            label,
            last_row: Mutex::new(Vec::new()),
        }
    }

    pub fn last_row(&self) -> Vec<f64> {
        self.last_row.lock().unwrap().clone()
    }
}

impl BinaryClassifier for FixedClassifier {
    fn predict(&self, features: &[f64]) -> Result<u8, ModelError> {
        *self.last_row.lock().unwrap() = features.to_vec();
        Ok(self.label)
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Everything a route test needs
pub struct TestApp {
    pub router: Router,
    pub resources: Arc<ServerResources>,
    pub store: Arc<dyn DocumentStore>,
    pub llm: Arc<ScriptedLlm>,
    pub classifier: Arc<FixedClassifier>,
}

/// Build the full router over an in-memory store and fakes
pub fn test_app_with(recognized: Option<FoodConcept>, label: u8) -> TestApp {
    init_test_logging();

    let logger = AppLogger::new("test");
    let config = ServerConfig {
        database_url: DatabaseUrl::Memory,
        ..ServerConfig::default()
    };
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new(logger.child("store")));
    let llm = Arc::new(ScriptedLlm::default());
    let classifier = Arc::new(FixedClassifier::new(label));

    let external = ExternalServices {
        verifier: Arc::new(StaticVerifier),
        identity: Arc::new(FakeIdentity),
        llm: llm.clone(),
        vision: Arc::new(FixedRecognizer(recognized)),
    };
    let resources = Arc::new(ServerResources::new(
        Arc::new(config),
        store.clone(),
        external,
        classifier.clone(),
        MetricsConfig::default(),
        &logger,
    ));

    TestApp {
        router: build_router(resources.clone()),
        resources,
        store,
        llm,
        classifier,
    }
}

/// Default harness: recognizes pizza, classifier predicts "no"
pub fn test_app() -> TestApp {
    test_app_with(
        Some(FoodConcept {
            name: "pizza".to_owned(),
            confidence: 0.97,
        }),
        0,
    )
}

impl TestApp {
    /// Send a JSON request and return the status and parsed body
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", format!("Bearer {}", token_for(user_id)));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Send a prepared request
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    /// Create a user document with a complete profile
    pub async fn seed_user(&self, user_id: &str) {
        let (status, _) = self
            .call(
                Method::POST,
                "/api/user/createUser",
                Some(user_id),
                Some(json!({"email": format!("{user_id}@example.com")})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = self
            .call(
                Method::PUT,
                "/api/user/profile",
                Some(user_id),
                Some(complete_profile()),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
