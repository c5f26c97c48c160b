//! Back-office start node gate
//!
//! Reverse proxy enforcing per-user start node restrictions over a CMS
//! back-office API.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use treegate::{
    backend::BackendClient,
    config::{AppConfig, LogFormat, load_config},
    rewrite::{RewriteDispatcher, RouteTable},
    server::{self, AppState},
    session::HeaderSessionResolver,
    startnodes::{HttpAssignmentStore, StartNodeResolver},
};

/// Back-office start node gate - per-user subtree restriction proxy
#[derive(Parser, Debug)]
#[command(name = "treegate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "TREEGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TREEGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Listen host (overrides configuration)
    #[arg(long, env = "TREEGATE_HOST")]
    host: Option<String>,

    /// Listen port (overrides configuration)
    #[arg(long, env = "TREEGATE_PORT")]
    port: Option<u16>,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let backend = Arc::new(BackendClient::new(&config.upstream)?);

    let store = HttpAssignmentStore::new(
        Arc::clone(&backend),
        config.upstream.assignments_path.clone(),
    );
    let resolver = Arc::new(StartNodeResolver::new(Arc::new(store)));

    let routes = RouteTable::backoffice(&config.upstream.route_prefix);
    let dispatcher = RewriteDispatcher::new(
        resolver,
        Arc::clone(&backend),
        config.access.limit_pickers_to_start_nodes,
    );
    let sessions = HeaderSessionResolver::new(
        config.session.user_id_header.clone(),
        config.session.admin_header.clone(),
    );

    Ok(AppState {
        routes: Arc::new(routes),
        dispatcher: Arc::new(dispatcher),
        sessions: Arc::new(sessions),
        backend,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())
        .inspect_err(|e| eprintln!("Failed to load configuration: {e}"))?;

    init_logging(&args, &config);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        upstream = %config.upstream.url,
        "Starting start node gate"
    );

    let state = build_state(&config)
        .inspect_err(|e| error!(error = %e, "Failed to build proxy state"))?;

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address {host}:{port}: {e}"))?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    server::run(state, addr, shutdown).await?;
    Ok(())
}
