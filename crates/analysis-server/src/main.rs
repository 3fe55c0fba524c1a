//! Memory analysis server
//!
//! Serves min/mean/max envelopes and memory-utilization rankings to the
//! dashboard backend, reading telemetry from a JSON dump.

use analysis_lib::{AnalysisService, MemorySource, StructuredLogger};
use analysis_server::{api, config};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting analysis-server");

    let config = config::ServerConfig::load()?;
    info!(
        instance = %config.instance_name,
        data_path = %config.data_path.display(),
        schema = ?config.schema,
        "Server configured"
    );

    let source = MemorySource::from_path(&config.data_path)
        .await
        .context("Failed to load telemetry source")?;

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVICE_VERSION, source.table_count());

    let service = AnalysisService::new(Arc::new(source), config.analysis())
        .with_logger(logger.clone());
    let app_state = Arc::new(api::AppState::new(service));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result.context("API server task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }
    info!("Shutting down");

    Ok(())
}
