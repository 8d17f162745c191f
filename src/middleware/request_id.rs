// ABOUTME: Copies the x-request-id header into the body of error responses
// ABOUTME: Lets clients quote the id from the JSON payload when reporting a failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use axum::{
    body::Body,
    extract::Request,
    http::header::{HeaderValue, CONTENT_LENGTH},
    middleware::Next,
    response::Response,
};

use crate::errors::ErrorResponse;

/// Header set by `SetRequestIdLayer` before the request reaches the router
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fill `error.request_id` on responses rendered from an `AppError`
///
/// Must run inside `SetRequestIdLayer` so the header is already present.
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let mut response = next.run(request).await;

    let Some(request_id) = request_id else {
        return response;
    };
    let Some(mut body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };

    body.error.request_id = Some(request_id);
    let Ok(bytes) = serde_json::to_vec(&body) else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts
        .headers
        .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    Response::from_parts(parts, Body::from(bytes))
}
