use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn,
    routing::{get, post},
    Router, ServiceExt,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::config::ServerConfig;
use crate::fetch::{HttpFetcher, PackageFetcher};
use crate::handlers::{analyze_template, generate_deck, health_check, patch_deck, root};
use crate::middleware::log_requests;

/// Routes registered by [`build_router`], logged at startup.
pub const ROUTES: [(&str, &str); 5] = [
    ("GET", "/"),
    ("GET", "/health"),
    ("POST", "/template/analyze"),
    ("POST", "/deck/generate"),
    ("POST", "/deck/patch"),
];

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub fetcher: Arc<dyn PackageFetcher>,
}

impl AppState {
    pub fn new(config: ServerConfig, fetcher: Arc<dyn PackageFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/template/analyze", post(analyze_template))
        .route("/deck/generate", post(generate_deck))
        .route("/deck/patch", post(patch_deck))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The router wrapped so that `/health/` and `/health` hit the same route.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

pub struct Application {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: AppState,
}

impl Application {
    pub async fn build(config: ServerConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout(), config.max_upload_bytes)
            .context("Failed to create HTTP client")?;
        Self::build_with_fetcher(config, Arc::new(fetcher)).await
    }

    pub async fn build_with_fetcher(
        config: ServerConfig,
        fetcher: Arc<dyn PackageFetcher>,
    ) -> anyhow::Result<Self> {
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            state: AppState::new(config, fetcher),
        })
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        log::info!("Listening on http://{}", self.local_addr);
        for (method, path) in ROUTES {
            log::info!("  {} {}", method, path);
        }
        log::info!(
            "Upload limit {} bytes, fetch timeout {}s",
            self.state.config.max_upload_bytes,
            self.state.config.fetch_timeout_secs
        );

        let app = build_app(self.state);
        axum::serve(self.listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
