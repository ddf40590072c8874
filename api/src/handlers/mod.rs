//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod health;
pub mod products;
pub mod users;

use axum::http::{Method, Uri};

use crate::error::AppError;

pub use health::health;
pub use products::products;

/// Fallback for unmatched paths
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {} {}", method, uri.path()))
}
