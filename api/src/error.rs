//! Unified error types for the storefront API
//!
//! This module defines error types for each layer:
//! - `DomainError`: persistence and business errors raised behind the ports
//! - `ConnectionError`: MongoDB connection lifecycle errors
//! - `StartupError`: fatal errors that stop the process before it serves traffic
//! - `AppError`: application layer errors (wraps domain errors for HTTP responses)

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The shared connection is not open (never connected, or already closed)
    #[error("Database unavailable: {0}")]
    Unavailable(String),
}

/// MongoDB connection errors
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid connection string: {0}")]
    InvalidUri(#[source] mongodb::error::Error),

    #[error("MongoDB connection failed: {0}")]
    Unreachable(#[source] mongodb::error::Error),
}

/// Errors that abort startup. Each one ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] ConnectionError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unprocessable body: {0}")]
    UnprocessableBody(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error response body for JSON responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

/// Marks a response as already rendered from an `AppError`.
///
/// The error handler middleware uses it to tell handler errors apart from
/// framework defaults (404, 405, extractor rejections) that still need a JSON body.
#[derive(Debug, Clone)]
pub struct RenderedError {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable",
                None,
            ),
            AppError::Domain(DomainError::Database(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
            AppError::MalformedJson(msg) => (
                StatusCode::BAD_REQUEST,
                "Malformed JSON body",
                Some(msg.clone()),
            ),
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload too large",
                Some(format!("limit is {} bytes", limit)),
            ),
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Media Type",
                Some(msg.clone()),
            ),
            AppError::UnprocessableBody(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Unprocessable Entity",
                Some(msg.clone()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
        };

        let mut response = (status, Json(ErrorResponse::new(error, details))).into_response();
        response.extensions_mut().insert(RenderedError {
            message: self.to_string(),
        });
        response
    }
}
