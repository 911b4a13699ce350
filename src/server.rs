//! HTTP server: shared state, routes and middleware.

use crate::ai::ProviderRegistry;
use crate::handlers;
use crate::translate::Translator;
use crate::upload::ImageUploader;
use crate::wire::Pacing;
use crate::workflow::WorkflowService;
use crate::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart framing and the `namespace` field on top of the file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<dyn WorkflowService>,
    pub providers: Arc<ProviderRegistry>,
    pub translator: Translator,
    pub uploader: ImageUploader,
    pub pacing: Pacing,
    /// Workflow prompt used when the conversation has no user text.
    pub default_input: Option<String>,
}

#[cfg(test)]
impl AppState {
    pub(crate) fn for_tests() -> Self {
        let providers = Arc::new(ProviderRegistry::empty());
        Self {
            workflow: Arc::new(crate::workflow::MockWorkflowClient::new()),
            providers: providers.clone(),
            translator: Translator::new(providers, "openai/gpt-4o-mini".to_string()),
            uploader: ImageUploader::new(
                Arc::new(crate::upload::MockUploadClient::new()),
                1024 * 1024,
            ),
            pacing: Pacing::immediate(),
            default_input: None,
        }
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.uploader.max_bytes() + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/api/chat", post(handlers::chat::handle_chat))
        .route("/api/upload", post(handlers::upload::handle_upload))
        .route("/healthz", get(handlers::handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
