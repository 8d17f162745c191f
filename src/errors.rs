// ABOUTME: Error types for the server crate, re-exported from glucowise-core
// ABOUTME: AppError renders as a JSON error body with an HTTP status derived from its ErrorCode
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Unified error handling; see [`glucowise_core::errors`].

pub use glucowise_core::errors::{
    AppError, AppResult, DomainError, ErrorCode, ErrorResponse,
    ErrorResponseDetails,
};
