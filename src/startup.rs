//! Application startup and lifecycle management.

use crate::config::CaptionConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::providers::gemini::{GeminiCaptionProvider, GeminiConfig};
use crate::services::providers::CaptionProvider;
use crate::services::CaptionWorkflow;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CaptionConfig,
    pub provider: Arc<dyn CaptionProvider>,
    pub workflow: Arc<CaptionWorkflow>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini provider.
    pub async fn build(config: CaptionConfig) -> Result<Self, AppError> {
        let gemini_config = GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.generation.model.clone(),
        };
        let provider: Arc<dyn CaptionProvider> =
            Arc::new(GeminiCaptionProvider::new(gemini_config));

        tracing::info!(
            model = %config.generation.model,
            "Initialized Gemini caption provider"
        );

        Self::build_with_provider(config, provider).await
    }

    /// Build the application with an injected provider (used by tests).
    pub async fn build_with_provider(
        config: CaptionConfig,
        provider: Arc<dyn CaptionProvider>,
    ) -> Result<Self, AppError> {
        let workflow = Arc::new(CaptionWorkflow::new(provider.clone(), &config.poll));

        let state = AppState {
            config: config.clone(),
            provider,
            workflow,
        };

        // Port 0 = random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route("/api/upload", post(handlers::upload_video))
            // No upload-size limit; the whole body is accepted as-is.
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the application until the server stops.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, Self::router(self.state)).await
    }
}
