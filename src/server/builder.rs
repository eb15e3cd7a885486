//! ServerBuilder: wires configuration, storage and the session guard into a router

use super::router::build_router;
use super::state::{AppState, CookieSettings};
use crate::config::AppConfig;
use crate::core::OrderRepository;
use crate::storage::connect_repository;
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the admin HTTP server
///
/// # Example
///
/// ```ignore
/// let config = AppConfig::load(None)?;
/// ServerBuilder::new(config).serve().await?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    repository: Option<Arc<dyn OrderRepository>>,
}

impl ServerBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            repository: None,
        }
    }

    /// Use this repository instead of the one named by `config.storage`
    pub fn with_repository(mut self, repository: impl OrderRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Same as [`with_repository`](Self::with_repository) for an already shared repository
    pub fn with_shared_repository(mut self, repository: Arc<dyn OrderRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the handler state, connecting storage if needed
    pub async fn build_state(&mut self) -> Result<AppState> {
        let repository = match self.repository.take() {
            Some(repository) => repository,
            None => connect_repository(&self.config.storage)
                .await
                .context("failed to open order storage")?,
        };

        let cookies = CookieSettings {
            secure: self.config.session.secure_cookie,
            max_age_secs: self.config.session.ttl_secs,
        };

        Ok(AppState::new(
            repository,
            self.config.session_guard(),
            cookies,
        ))
    }

    /// Build the router
    pub async fn build(mut self) -> Result<Router> {
        let state = self.build_state().await?;
        tracing::info!(
            storage = state.repository.backend(),
            production = self.config.production,
            "admin service configured"
        );
        Ok(build_router(state, self.config.production))
    }

    /// Serve on `config.bind` with graceful shutdown
    ///
    /// This will:
    /// - Bind to the configured address
    /// - Start serving requests, exposing the peer address to handlers
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind.clone();
        let app = self.build().await?;
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
