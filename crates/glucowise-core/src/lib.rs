// ABOUTME: Core types for the GlucoWise health API platform
// ABOUTME: Foundation crate with error handling, closed health enumerations, and the logging handle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

#![deny(unsafe_code)]

//! # GlucoWise Core
//!
//! Foundation crate providing shared types for the GlucoWise platform. This crate
//! changes infrequently, so the server and intelligence crates compile incrementally
//! on top of it.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `DomainError`
//! - **models**: Closed enumerations and the health `Profile`
//! - **logging**: `AppLogger`, the component logging handle injected into constructors

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Closed health enumerations and profile types
pub mod models;

/// Injectable structured logging handle
pub mod logging;

pub use errors::{AppError, AppResult, DomainError, ErrorCode};
pub use logging::AppLogger;
