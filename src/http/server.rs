//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared outbound client (probe + download)
//! - Assemble the pipeline with its collaborators
//! - Create the Axum Router and wire middleware (tracing, request ID)
//! - Serve until the shutdown signal, letting in-flight bodies (and their cleanup) finish

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::cleanup::{CleanupService, LocalFileCleanup};
use crate::config::{ServiceConfig, UpstreamConfig};
use crate::filter::{FilterService, ImageFilter};
use crate::http::handlers;
use crate::http::request::make_request_span;
use crate::pipeline::{ImagePipeline, Prober};

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ImagePipeline,
}

/// HTTP server for the filtered-image endpoint.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server with the default filter and local file cleanup.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        let client = build_client(&config.upstream)?;
        let filter = Arc::new(ImageFilter::new(client.clone(), &config.filter));
        Ok(Self::assemble(config, client, filter, Arc::new(LocalFileCleanup)))
    }

    /// Create a server with caller-supplied collaborators.
    pub fn with_services(
        config: ServiceConfig,
        filter: Arc<dyn FilterService>,
        cleanup: Arc<dyn CleanupService>,
    ) -> Result<Self, ServerError> {
        let client = build_client(&config.upstream)?;
        Ok(Self::assemble(config, client, filter, cleanup))
    }

    fn assemble(
        config: ServiceConfig,
        client: reqwest::Client,
        filter: Arc<dyn FilterService>,
        cleanup: Arc<dyn CleanupService>,
    ) -> Self {
        let state = AppState {
            pipeline: ImagePipeline::new(Prober::new(client), filter, cleanup),
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/filteredimage", get(handlers::filtered_image))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, e.g. for driving with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            output_dir = %self.config.filter.output_dir.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Shared outbound client. No timeout unless configured.
fn build_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}
