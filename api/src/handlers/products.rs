//! Product handlers
//!
//! Placeholder route; answers every method and sub-path the same way.

use axum::Json;
use serde::Serialize;

pub const PRODUCTS_MESSAGE: &str = "This is a new feature change, a new route for products";

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub message: &'static str,
}

/// ANY /api/products
pub async fn products() -> Json<ProductsResponse> {
    Json(ProductsResponse {
        message: PRODUCTS_MESSAGE,
    })
}
