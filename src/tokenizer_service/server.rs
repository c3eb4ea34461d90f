//! Tokenizer Service Server
//!
//! HTTP server that exposes the tokenize endpoint and health probes.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
};
use tracing::{info, warn};

use super::{
    config::TokenizerServiceConfig,
    handlers::{self, HandlerState},
};
use crate::tokenizer::{HubTokenizerLoader, TokenizationEngine, TokenizerCache, TokenizerLoader};

/// Tokenizer Service Server
pub struct TokenizerServer {
    config: TokenizerServiceConfig,
    engine: TokenizationEngine,
}

impl TokenizerServer {
    /// Create a new TokenizerServer that loads tokenizers from disk or the HuggingFace Hub
    pub fn new(
        config: TokenizerServiceConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut loader = HubTokenizerLoader::new().with_boundary_markers(config.boundary_markers);
        if let Some(dir) = &config.hub_cache_dir {
            loader = loader.with_cache_dir(dir.clone());
        }
        Self::with_loader(config, Arc::new(loader))
    }

    /// Create with a custom loader (for testing or custom setup)
    pub fn with_loader(
        config: TokenizerServiceConfig,
        loader: Arc<dyn TokenizerLoader>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        config.validate()?;
        info!(
            cache_capacity = config.cache_capacity,
            load_timeout_ms = ?config.load_timeout_ms,
            authenticated = config.hf_token.is_some(),
            "Initializing TokenizerServer"
        );

        let cache = TokenizerCache::new(config.cache_capacity()?, loader)
            .with_credential(config.hf_token.clone())
            .with_load_timeout(config.load_timeout());
        let engine = TokenizationEngine::new(Arc::new(cache));

        Ok(Self { config, engine })
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let state = Arc::new(HandlerState::new(
            self.engine.clone(),
            self.config.max_concurrent_requests,
            self.config.log_requests,
        ));

        // CORS configuration
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            // Health endpoints
            .route("/health", get(handlers::health_handler))
            .route("/liveness", get(handlers::liveness_handler))
            .route("/readiness", get(handlers::health_handler))
            .route("/api/tokenize", post(handlers::tokenize_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(handlers::panic_response))
            .layer(cors)
    }

    /// Start the HTTP server and run until Ctrl-C or SIGTERM
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.http_bind_addr();
        info!("Starting TokenizerServer on {}", addr);

        let router = self.build_router();

        let listener = TcpListener::bind(&addr).await?;
        info!("TokenizerServer listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        info!("TokenizerServer stopped");
        Ok(())
    }

    pub fn config(&self) -> &TokenizerServiceConfig {
        &self.config
    }

    /// Get the tokenization engine
    pub fn engine(&self) -> &TokenizationEngine {
        &self.engine
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
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
