//! HTTP server exposing the annotate endpoint.

mod error;
mod handlers;

use annotator_core::{BatchAnnotator, RequestDefaults};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct AppState {
    pub annotator: BatchAnnotator,
    pub defaults: Arc<RequestDefaults>,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/annotate", post(handlers::annotate_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState, max_upload_bytes: usize) -> anyhow::Result<()> {
    let app = router(state, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Annotator listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
