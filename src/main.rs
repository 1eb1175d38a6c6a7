//! Filtered-image server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────────┐
//!                     │                  FILTERED-IMAGE SERVER                   │
//!                     │                                                          │
//!  GET /filteredimage │  ┌──────────┐   ┌──────────┐   ┌──────────┐             │
//!  ───────────────────┼─▶│ validate │──▶│  probe   │──▶│  filter  │──── HEAD/GET ┼──▶ Image
//!                     │  └──────────┘   └──────────┘   └────┬─────┘             │    origin
//!                     │                                      │ artifact          │
//!                     │                                      ▼                   │
//!  200 image/jpeg     │  ┌──────────┐   ┌──────────────────────┐                │
//!  ◀──────────────────┼──│  stream  │◀──│ local output_dir     │                │
//!                     │  └────┬─────┘   └──────────────────────┘                │
//!                     │       │ body done / dropped                              │
//!                     │       ▼                                                  │
//!                     │  ┌──────────┐                                            │
//!                     │  │ cleanup  │  deletes the artifact exactly once         │
//!                     │  └──────────┘                                            │
//!                     └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use filtered_image_server::config::{load_config, ServiceConfig};
use filtered_image_server::lifecycle::startup;
use filtered_image_server::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "filtered-image-server", version)]
#[command(about = "Filters public images and streams the result back", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port; overrides the port in the configured bind address.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.override_port(port);
    }

    init_logging(&config.observability);
    tracing::info!("filtered-image-server v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
