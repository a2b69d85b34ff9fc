//! hostsim server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (tower-http layers)
//!                          │
//!                          ▼
//!                     http::cors ── OPTIONS ──▶ 200
//!                          │
//!                          ▼
//!                     dispatch::hostname ── rule? ──▶ rule response ──▶ access_log
//!                          │                                               │
//!                          ▼                                               ▼
//!              ┌───────────┴─────────────┐                         report (analytics,
//!              ▼                         ▼                          weekly email)
//!        admin (session guard,     dispatch::simulate
//!        rules API, exports)       (/{code}, /health, /, 404)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use hostsim::config::schema::DEFAULT_ADMIN_PASSWORD;
use hostsim::config::{load_config, validate_config, ConfigError, SimConfig};
use hostsim::lifecycle::{wait_for_signal, Shutdown};
use hostsim::observability::{logging, metrics};
use hostsim::HttpServer;

#[derive(Parser)]
#[command(name = "hostsim")]
#[command(about = "HTTP status and redirect simulator with per-hostname overrides", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(long, env = "HOSTSIM_BIND")]
    bind: Option<String>,

    /// Admin password, overrides `admin.password`.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Store directory, overrides `storage.data_dir`.
    #[arg(long, env = "HOSTSIM_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<SimConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(password) = self.admin_password {
            config.admin.password = password;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hostsim starting");

    if config.admin.password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!("Admin password is the built-in default; set ADMIN_PASSWORD before exposing this server");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_dir = ?config.storage.data_dir,
        admin_prefix = %config.admin.path_prefix,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
