//! Error response normalization middleware
//!
//! Framework-level rejections (malformed JSON, unknown routes, wrong
//! methods) come back as text/plain. This rewrites them into the same
//! `{"error", "code"}` body that `AppError` produces.

use crate::error::VALIDATION_FAILED_MESSAGE;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Paths that answer with their own plain-text bodies.
const PASSTHROUGH_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let passthrough = PASSTHROUGH_PATHS.contains(&request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if passthrough || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let (code, message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Invalid request body"),
        StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Unauthenticated."),
        StatusCode::FORBIDDEN => ("FORBIDDEN", "This action is unauthorized."),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => ("METHOD_NOT_ALLOWED", "Method not allowed"),
        StatusCode::CONFLICT => ("CONFLICT", "Resource conflict"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request body too large"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("UNSUPPORTED_MEDIA_TYPE", "Unsupported content type")
        }
        StatusCode::UNPROCESSABLE_ENTITY => ("VALIDATION_FAILED", VALIDATION_FAILED_MESSAGE),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timed out"),
        _ if status.is_client_error() => ("CLIENT_ERROR", "Client error"),
        _ => ("INTERNAL_ERROR", "An internal error occurred"),
    };

    let body = json!({
        "error": message,
        "code": code,
    });

    (status, axum::Json(body)).into_response()
}
