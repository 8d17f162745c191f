// ABOUTME: HTTP middleware applied around every route group
// ABOUTME: Currently stamps the request id onto JSON error bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

/// Request-id correlation for error responses
pub mod request_id;

pub use request_id::attach_request_id;
