//! Terminal error handling middleware
//!
//! Every error response produced further down the stack passes through here
//! exactly once: it is logged, counted, and given the uniform JSON body
//! `{"error": ..., "details"?: ...}`. Responses rendered from `AppError`
//! already carry that body; framework defaults (405, extractor rejections)
//! are re-rendered. Nothing in this module can fail.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ErrorResponse, RenderedError};

/// Upper bound on how much of a framework error body is kept as `details`
const MAX_DETAILS_BYTES: usize = 16 * 1024;

/// Count of error responses handled since startup
#[derive(Debug, Clone, Default)]
pub struct ErrorCounter(Arc<AtomicU64>);

impl ErrorCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

pub async fn handle_errors(
    State(counter): State<ErrorCounter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    counter.record();

    if let Some(rendered) = response.extensions().get::<RenderedError>() {
        log_error(status, method.as_str(), &path, &rendered.message);
        return response;
    }

    let (parts, body) = response.into_parts();
    let details = axum::body::to_bytes(body, MAX_DETAILS_BYTES)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .filter(|text| !text.is_empty());

    log_error(
        status,
        method.as_str(),
        &path,
        details.as_deref().unwrap_or_default(),
    );

    let summary = status.canonical_reason().unwrap_or("Error");
    let mut rendered = (status, Json(ErrorResponse::new(summary, details))).into_response();

    // Keep headers such as `Allow` on 405 responses
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }

    rendered
}

fn log_error(status: StatusCode, method: &str, path: &str, message: &str) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), %method, %path, "{}", message);
    } else {
        tracing::warn!(status = status.as_u16(), %method, %path, "{}", message);
    }
}

/// Turns a handler panic into a 500 instead of a reset connection.
///
/// Installed inside `handle_errors`, so the panic is logged and counted there.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", None)),
    )
        .into_response();
    response.extensions_mut().insert(RenderedError {
        message: format!("handler panicked: {}", message),
    });
    response
}
