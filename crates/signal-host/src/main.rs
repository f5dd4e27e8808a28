//! Signal Host - Main Entry Point

use metrics_exporter_prometheus::PrometheusBuilder;
use sample_transport::TcpRecordSource;
use signal_host::{init_logging, run_server, spawn_ingestion, AppState, HostConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Signal Host v{} ===", env!("CARGO_PKG_VERSION"));
    let config = HostConfig::load()?;

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };
    let state = Arc::new(AppState::new(&config, metrics)?);

    let device = config.device_addr();
    match TcpRecordSource::connect(&device).await {
        Ok(source) => {
            spawn_ingestion(&state, source);
        }
        // Keep serving; health reports ingestion as stopped
        Err(e) => error!("Cannot reach device at {}: {}", device, e),
    }

    run_server(state, &config.listen).await
}
