//! Configuration endpoint

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::server::types::ConfigResponse;

/// GET /api/config - non-sensitive runtime settings
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = &state.config;

    Json(ConfigResponse {
        provider: config.llm.provider.as_str().to_string(),
        model: config.llm.model.clone(),
        max_tasks: config.planner.max_tasks,
        chunk_size: config.reveal.chunk_size,
    })
}
