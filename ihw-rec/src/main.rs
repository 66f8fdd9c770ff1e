//! ihw-rec (Homework Recommendation) - main entry point
//!
//! Serves topic-driven and calendar-driven homework recommendations,
//! optionally delegating to an external scoring engine.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ihw_common::config::{load_toml_config, resolve_config_path};
use ihw_common::Dataset;
use ihw_rec::engine::Recommender;
use ihw_rec::store::CurriculumStore;
use ihw_rec::{build_router, AppState};
use tokio::signal;
use tracing::info;

/// Command-line arguments for ihw-rec
#[derive(Parser, Debug)]
#[command(name = "ihw-rec")]
#[command(about = "Homework recommendation microservice")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "IHW_PORT")]
    port: Option<u16>,

    /// Curriculum dataset JSON (overrides config)
    #[arg(long, env = "IHW_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// External scoring engine URL (overrides config)
    #[arg(long, env = "IHW_SCORING_URL")]
    scoring_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = load_toml_config(config_path.as_deref())
        .context("Failed to load configuration")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if args.data_file.is_some() {
        config.data_file = args.data_file;
    }
    if args.scoring_url.is_some() {
        config.external_engine.url = args.scoring_url;
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    info!(
        "Starting IHW Homework Recommendation (ihw-rec) v{}",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let dataset = Dataset::load_or_demo(config.data_file.as_deref())
        .context("Failed to load curriculum dataset")?;
    info!(
        items = dataset.catalogue.len(),
        learners = dataset.learners.len(),
        "Curriculum dataset ready"
    );

    let recommender =
        Recommender::from_config(&config).context("Failed to build scoring client")?;

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("Invalid bind address")?;

    let state = AppState::new(
        CurriculumStore::new(dataset),
        recommender,
        config.recommendation.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("ihw-rec listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
