//! API Server Module
//!
//! Router construction and the server lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sprintwright_core::{ConversationStore, ServerConfig};

use crate::handlers::{cancel_run, delete_conversation, health_check, list_tools, run_agent, ApiState};

/// Build the application router over shared state
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/agent/run", post(run_agent))
        .route("/agent/runs/:run_id/cancel", post(cancel_run))
        .route("/agent/tools", get(list_tools))
        .route("/agent/conversations/:id", delete(delete_conversation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Main API server
pub struct ApiServer {
    config: ServerConfig,
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: ApiState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> &Arc<ApiState> {
        &self.state
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.config.host, self.config.port))?;

        let sweeper = CancellationToken::new();
        tokio::spawn(sweep_conversations(
            self.state.conversations.clone(),
            Duration::from_secs(self.config.conversation_sweep_seconds.max(1)),
            sweeper.clone(),
        ));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Sprintwright API server listening on {}", addr);

        let served = axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("API server failed: {}", e));
        sweeper.cancel();
        info!("Sprintwright API server stopped");
        served
    }
}

/// Drop idle conversations on a fixed interval until cancelled
pub async fn sweep_conversations(store: Arc<ConversationStore>, every: Duration, stop: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = interval.tick() => {
                store.expire_idle();
            }
        }
    }
}
