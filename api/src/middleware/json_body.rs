//! JSON body parsing middleware

use std::error::Error as _;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Largest JSON body accepted, in bytes
pub const MAX_JSON_BODY: usize = 100 * 1024;

/// The parsed request body, available to handlers as an `Extension`
#[derive(Debug, Clone)]
pub struct ParsedJson(pub Value);

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    let essence = content_type.split(';').next().unwrap_or("").trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };

    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json") || subtype.to_ascii_lowercase().ends_with("+json"))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.parse().ok())
}

fn read_error(e: axum::Error) -> AppError {
    let mut source = e.source();
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return AppError::PayloadTooLarge(MAX_JSON_BODY);
        }
        source = err.source();
    }
    AppError::BadRequest(format!("Failed to read request body: {}", e))
}

/// Body parsing middleware
///
/// For JSON requests, buffers and parses the body and injects `ParsedJson`
/// into request extensions. Malformed JSON never reaches the route handler.
/// Bodies over `MAX_JSON_BODY` are rejected whether or not they declare a
/// length up front.
pub async fn parse_json_body(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    if declared_length(request.headers()).is_some_and(|len| len > MAX_JSON_BODY) {
        return Err(AppError::PayloadTooLarge(MAX_JSON_BODY));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_JSON_BODY)
        .await
        .map_err(read_error)?;

    let parsed = if bytes.is_empty() {
        None
    } else {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::MalformedJson(e.to_string()))?;
        Some(ParsedJson(value))
    };

    let mut request = Request::from_parts(parts, Body::from(bytes));
    if let Some(parsed) = parsed {
        request.extensions_mut().insert(parsed);
    }

    Ok(next.run(request).await)
}

/// Typed handler input taken from the body `parse_json_body` already parsed
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(ParsedJson(value)) = parts.extensions.remove::<ParsedJson>() else {
            return Err(if is_json(&parts.headers) {
                AppError::BadRequest("Expected a JSON body".to_string())
            } else {
                AppError::UnsupportedMediaType(
                    "Expected request with `Content-Type: application/json`".to_string(),
                )
            });
        };

        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| AppError::UnprocessableBody(e.to_string()))
    }
}
