//! HTTP server for the plan streaming service
//!
//! Exposes the streaming plan endpoint plus small health and config
//! endpoints. Each stream request owns its planner; the server shares only
//! read-only state.

pub mod routes;
pub mod state;
pub mod transport;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;
pub use transport::{write_sse, StreamTransport};
pub use types::{StatusFrame, WireEvent};

/// Build the router for `state`
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.server.cors_enabled;

    let mut app = Router::new()
        // Health & config
        .route("/api/health", get(routes::health::health_check))
        .route("/api/config", get(routes::config::get_config))

        // Plan stream (SSE)
        .route("/api/stream_tasks", get(routes::stream::stream_tasks))

        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let shutdown = state.shutdown.clone();
    let app = build_router(Arc::new(state));

    tracing::info!("Starting planstream server on http://{}", addr);
    tracing::info!("Stream endpoint: http://{}/api/stream_tasks?prompt=...", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C after cancelling every open plan stream
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        // Never resolve: the server keeps running without graceful shutdown
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, closing open plan streams");
    shutdown.cancel();
}
