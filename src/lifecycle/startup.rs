//! Startup orchestration.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Start every subsystem in order and serve until SIGINT/SIGTERM.
///
/// Expects logging to be initialized already.
pub async fn run(config: ServiceConfig) -> Result<(), ServerError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        output_dir = %config.filter.output_dir.display(),
        width = config.filter.width,
        height = config.filter.height,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .map_err(|_| ServerError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "server running, press CTRL+C to stop"
    );

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let signal_task = shutdown.trigger_on_signal();
    let result = server.run(listener, shutdown_rx).await;
    signal_task.abort();

    result.map_err(ServerError::from)
}
