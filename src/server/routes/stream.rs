//! Server-Sent Events (SSE) endpoint for streaming task plans

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use tokio_stream::StreamExt;

use crate::server::state::AppState;
use crate::server::types::{ErrorResponse, StreamTasksParams};
use crate::utils::truncate_str;

/// GET /api/stream_tasks?prompt=... - stream a plan as it is generated
pub async fn stream_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamTasksParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)> {
    let prompt = params.prompt.trim();
    if prompt.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query parameter 'prompt' must not be empty".to_string(),
                code: "EMPTY_PROMPT".to_string(),
            }),
        ));
    }

    tracing::info!("Starting plan stream for prompt: {}", truncate_str(prompt, 80));

    let planner = state.planner(prompt);
    let stream = state
        .transport()
        .events(planner)
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_json())));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
