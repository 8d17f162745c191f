// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Runs serially because each test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors
#![allow(clippy::unwrap_used)]

use std::env;
use std::path::PathBuf;

use glucowise_server::config::{DatabaseUrl, Environment, ServerConfig};
use serial_test::serial;

const MANAGED_VARS: [&str; 12] = [
    "HTTP_PORT",
    "ENVIRONMENT",
    "DATABASE_URL",
    "FIREBASE_PROJECT_ID",
    "FIREBASE_WEB_API_KEY",
    "GEMINI_API_KEY",
    "PALM_API_KEY",
    "CLARIFAI_PAT",
    "DIABETES_MODEL_PATH",
    "CHAT_HISTORY_LIMIT",
    "DIET_HISTORY_LIMIT",
    "GEMINI_MODEL",
];

fn reset_env() {
    for key in MANAGED_VARS {
        env::remove_var(key);
    }
}

fn set_credentials() {
    env::set_var("FIREBASE_PROJECT_ID", "glucowise-test");
    env::set_var("FIREBASE_WEB_API_KEY", "web-key");
    env::set_var("GEMINI_API_KEY", "gemini-key");
    env::set_var("CLARIFAI_PAT", "clarifai-pat");
}

#[test]
#[serial]
fn test_from_env_reads_overrides() {
    reset_env();
    set_credentials();
    env::set_var("HTTP_PORT", "9090");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("DATABASE_URL", "sqlite:./data/test.db");
    env::set_var("DIABETES_MODEL_PATH", "/models/forest.json");
    env::set_var("CHAT_HISTORY_LIMIT", "4");

    let config = ServerConfig::from_env().unwrap();
    reset_env();

    assert_eq!(config.http_port, 9090);
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(
        config.database_url,
        DatabaseUrl::SQLite {
            path: PathBuf::from("./data/test.db")
        }
    );
    assert_eq!(
        config.classifier.model_path,
        PathBuf::from("/models/forest.json")
    );
    assert_eq!(config.limits.chat_history_limit, 4);
    assert_eq!(config.limits.diet_history_limit, 50);
    assert_eq!(config.firebase.project_id.as_deref(), Some("glucowise-test"));
}

#[test]
#[serial]
fn test_legacy_model_key_is_accepted() {
    reset_env();
    set_credentials();
    env::remove_var("GEMINI_API_KEY");
    env::set_var("PALM_API_KEY", "palm-key");

    let config = ServerConfig::from_env().unwrap();
    reset_env();

    assert_eq!(config.gemini.api_key.as_deref(), Some("palm-key"));
}

#[test]
#[serial]
fn test_missing_credentials_are_listed() {
    reset_env();
    env::set_var("FIREBASE_WEB_API_KEY", "web-key");
    env::set_var("GEMINI_API_KEY", "   ");

    let err = ServerConfig::from_env().unwrap_err();
    reset_env();

    let message = err.to_string();
    assert!(message.contains("GEMINI_API_KEY"), "{message}");
    assert!(message.contains("CLARIFAI_PAT"), "{message}");
    assert!(!message.contains("FIREBASE_WEB_API_KEY"), "{message}");
}

#[test]
#[serial]
fn test_invalid_port_is_rejected() {
    reset_env();
    set_credentials();
    env::set_var("HTTP_PORT", "not-a-port");

    let result = ServerConfig::from_env();
    reset_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_zero_history_limit_fails_validation() {
    reset_env();
    set_credentials();
    env::set_var("DIET_HISTORY_LIMIT", "0");

    let result = ServerConfig::from_env();
    reset_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_memory_database_url() {
    reset_env();
    set_credentials();
    env::set_var("DATABASE_URL", "sqlite::memory:");

    let config = ServerConfig::from_env().unwrap();
    reset_env();

    assert!(config.database_url.is_memory());
    assert!(config.summary().contains("In-memory"));
}
