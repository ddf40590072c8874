use axum::{extract::State, Json};
use serde::Serialize;

use crate::adapters::ConnectionState;
use crate::server::Phase;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub phase: Phase,
    pub database: ConnectionState,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = *state.database.borrow();
    let phase = state.lifecycle.phase();

    let status = if database == ConnectionState::Open && phase == Phase::Listening {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        phase,
        database,
    })
}
