//! resque-exporter — serves Resque metrics for Prometheus.
//!
//! # Usage
//!
//! ```text
//! resque-exporter --redis.url redis://localhost:6379/0 --redis.namespace resque
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use resque_backend::{KeyNamespace, RedisBackend};
use resque_exporter::cli::Cli;
use resque_exporter::config::REDIS_URL_ENV;
use resque_exporter::{build_router, logging, VERSION};
use resque_metrics::Collector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_url = std::env::var(REDIS_URL_ENV).ok();
    let config = cli
        .load_config()?
        .with_env_redis_url(env_url.as_deref());
    config.validate()?;

    logging::init(&config.log_level, config.log_format)?;

    info!(version = VERSION, "starting resque-exporter");
    if env_url.is_some_and(|u| !u.is_empty()) {
        info!("redis url taken from {REDIS_URL_ENV}");
    }

    // Connection string errors are fatal; connecting happens on first scrape.
    let backend = RedisBackend::open(&config.redis_url)?;
    info!(
        redis = %backend.target(),
        namespace = %config.redis_namespace,
        "resque backend configured"
    );

    let collector = Arc::new(Collector::new(
        backend,
        KeyNamespace::new(config.redis_namespace.as_str()),
    ));
    let router = build_router(collector, &config.telemetry_path);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        addr = %listener.local_addr()?,
        telemetry_path = %config.telemetry_path,
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("resque-exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to install CTRL+C handler; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
