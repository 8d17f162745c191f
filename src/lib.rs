// ABOUTME: Main library entry point for the GlucoWise health API
// ABOUTME: Profile storage, body metrics, diabetes risk screening, and LLM-backed diet assistance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

#![deny(unsafe_code)]

//! # GlucoWise Server
//!
//! HTTP API behind the GlucoWise mobile app. Users keep a health profile; the server
//! derives body metrics from it, screens diabetes risk with a pre-trained classifier,
//! and asks a hosted language model for diet plans, advice, recipes and macro
//! breakdowns.
//!
//! ## Architecture
//!
//! - **`glucowise-core`**: error types, closed enumerations, the injected logger
//! - **`glucowise-intelligence`**: metrics chain, feature encoder, classifier adapter
//! - **Store**: JSON documents keyed by collection and ID (`SQLite` or in-memory)
//! - **External**: Firebase identity, Gemini, Clarifai food recognition
//! - **Services / Routes**: domain operations and their axum handlers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use glucowise_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     config.validate()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

/// Firebase ID-token verification and email/password identity operations
pub mod auth;

/// Environment configuration and metrics tables
pub mod config;

/// Unified error handling re-exported from the core crate
pub mod errors;

/// Hosted language model client, prompts and response schemas
pub mod llm;

/// Tracing subscriber setup and the injected logger
pub mod logging;

/// HTTP middleware shared by every route group
pub mod middleware;

/// Stored document shapes and structured model outputs
pub mod models;

/// Shared resource container
pub mod resources;

/// HTTP route groups
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Domain services behind the routes
pub mod services;

/// Document store abstraction with `SQLite` and in-memory backends
pub mod store;

/// Food recognition from images
pub mod vision;
