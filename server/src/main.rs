//! mailtrack server binary.
//!
//! Opens the tracker database and serves the tracking HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::Request;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::Level;

use mailtrack::{load_config, Config, Database};
use mailtrack_server::{router, AppState};

/// Email open tracking server.
#[derive(Parser, Debug)]
#[command(name = "mailtrack-server")]
#[command(about = "Serves tracking pixels and records email reads", long_about = None)]
struct Args {
    /// Path to a JSON config file (optional).
    #[arg(long, env = "MAILTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file and environment.
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database path, overriding the config file and environment.
    #[arg(long)]
    database: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let mut config = config.apply_env_overrides()?;

    if let Some(bind) = &args.bind {
        config.bind_addr = bind.clone();
    }
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    mailtrack::init_logging(config.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_addr = %config.bind_addr,
        database = %config.database_path.display(),
        client_ip_header = %config.client_ip_header,
        "configuration loaded"
    );

    let db = Database::open(&config.database_path)?;
    let state = AppState::from_config(db, &config)?;

    let app = router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
