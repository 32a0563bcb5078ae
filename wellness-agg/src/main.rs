//! wellness-agg - Wellness Metric Aggregation Service
//!
//! Loads the source catalog, registers one fetcher per source and serves
//! aggregation requests over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wellness_agg::{build_router, AppState};
use wellness_common::config::ConfigResolver;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "wellness-agg", version, about = "Wellness metric aggregation service")]
struct Args {
    /// Config file (overrides WELLNESS_CONFIG and ~/.config/wellness/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides [server] bind)
    #[arg(long, env = "WELLNESS_BIND")]
    bind: Option<String>,

    /// Source catalog file (overrides catalog_path)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("wellness-agg");
    let config_path = resolver.resolve_path(args.config.as_deref());
    let config = resolver
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting wellness-agg v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        _ => info!("Config: compiled defaults"),
    }

    let catalog = wellness_agg::config::load_catalog(&config, args.catalog.as_deref())
        .context("Failed to load source catalog")?;
    let engine = wellness_agg::config::build_engine(&config, &catalog)
        .context("Failed to initialize aggregation engine")?;
    info!(
        "Registered {} sources, {} distinct metrics",
        engine.source_count(),
        catalog.metric_names().len()
    );

    let state = AppState::new(engine, catalog, config.defaults.clone());
    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
