//! Dashboard development router.
//!
//! Forwards `/api/<service>/...` calls from the dashboard to the backend that
//! owns the prefix, stripping the prefix on the way.
//!
//! ```text
//!     Browser                 dashboard-router                   Backends
//!  ─────────────▶  ┌──────────────────────────────────┐
//!  /api/emissions  │ match prefix → rewrite → forward │ ──▶ host:4005 /summary
//!  /summary        └──────────────────────────────────┘
//!  ◀─────────────   status, headers, body streamed back  ◀──
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use dashboard_router::config::{load_config, ObservabilityConfig, RouterConfig};
use dashboard_router::lifecycle::{startup, Shutdown};
use dashboard_router::observability::{logging, metrics};
use dashboard_router::routing::build_route_table;
use dashboard_router::ConfigurationError;

#[derive(Parser)]
#[command(name = "dashboard-router", version)]
#[command(about = "Routes dashboard API prefixes to their backend services", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base host for offset-addressed services (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Base port for offset-addressed services (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve requests (default)
    Serve,
    /// Print the resolved route table and exit
    Routes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    logging::init_logging(&config.observability);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Routes { json } => print_routes(&config, json),
        Commands::Serve => serve(config).await,
    }
}

/// File, then environment, then command line.
fn resolve_config(cli: &Cli) -> Result<RouterConfig, ConfigurationError> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        config.upstream.base_host = host.clone();
    }
    if let Some(port) = cli.port {
        config.upstream.base_port = port;
    }
    Ok(config)
}

async fn serve(config: RouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("dashboard-router v{} starting", env!("CARGO_PKG_VERSION"));

    let server = startup::prepare(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration, refusing to start");
    })?;

    if config.observability.metrics_enabled {
        // validated while building the route table
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        connect_timeout_secs = config.timeouts.connect_secs,
        response_timeout_secs = config.timeouts.response_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_routes(config: &RouterConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let table = build_route_table(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(table.bindings())?);
        return Ok(());
    }

    for binding in table.bindings() {
        println!(
            "{:<32} -> http://{:<24} change_origin={:<5} rewrite={:?}",
            binding.prefix(),
            binding.target(),
            binding.change_origin(),
            binding.rewrite_rule(),
        );
    }
    Ok(())
}
