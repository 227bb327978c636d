//! HTTP surface.
//!
//! | Route | Method | Body |
//! |-------|--------|------|
//! | `/` | GET | `{"message": "..."}` liveness payload |
//! | `/extract_markdown` | POST | [`ConversionRequest`] → [`ConversionResult`] |

use crate::error::ServiceError;
use crate::handler::{ConversionHandler, ConversionRequest, ConversionResult};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Static payload of the liveness probe.
pub const HEALTH_MESSAGE: &str = "PDF to Markdown service is running.";

/// Response body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub message: String,
}

/// Build the router with all endpoints.
pub fn build_router(handler: Arc<ConversionHandler>) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/extract_markdown", post(extract_markdown))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn read_root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE.to_string(),
    })
}

async fn extract_markdown(
    State(handler): State<Arc<ConversionHandler>>,
    Json(request): Json<ConversionRequest>,
) -> Result<Json<ConversionResult>, ServiceError> {
    handler.handle(request).await.map(Json)
}

/// Bind `addr` and serve until Ctrl-C / SIGTERM.
pub async fn serve(addr: SocketAddr, handler: Arc<ConversionHandler>) -> std::io::Result<()> {
    let app = build_router(handler);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
