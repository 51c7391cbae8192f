//! Liveness probe

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::server::types::HealthResponse;

/// GET /api/health - reports the planning backend without calling it
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.shutdown.is_cancelled() { "shutting_down" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.config.llm.provider.as_str().to_string(),
    })
}
