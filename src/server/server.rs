//! HTTP server with axum router and graceful shutdown.

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    get_changes, get_graph_nodes, get_graph_stats, get_health, get_overload, post_detect_conflicts,
    post_event, post_query, AppState,
};
use crate::config::ServerConfig;
use crate::orchestrator::Orchestrator;

/// HTTP binding of the query and ingestion interfaces.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a server with default configuration around `orchestrator`.
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            config: ServerConfig::default(),
            state: AppState::new(orchestrator),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an externally owned shutdown token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the server when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Shared state, for callers that need the orchestrator while serving.
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/health", get(get_health))
            .route("/api/query", post(post_query))
            .route("/api/events", post(post_event))
            .route("/api/graph/stats", get(get_graph_stats))
            .route("/api/graph/nodes", get(get_graph_nodes))
            .route("/api/changes", get(get_changes))
            .route("/api/conflicts/detect", post(post_detect_conflicts))
            .route("/api/overload/:person", get(get_overload))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Bind the configured address and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::BindError {
                address: address.clone(),
                source,
            })?;
        tracing::info!(address = %address, "Starting API server");
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let cancel = self.cancel.clone();
        let app = self.build_router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("API server shutting down gracefully");
            })
            .await
            .map_err(ServerError::Serve)
    }
}
