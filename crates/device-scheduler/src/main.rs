//! Acquisition Device - Main Entry Point

use device_scheduler::{ConsoleDisplay, DeviceConfig, DeviceScheduler, SchedulerConfig, TransmitStatus};
use peripheral_reader::{PeripheralReader, SimulatedAdc};
use sample_transport::TcpSampleServer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging on stderr, leaving stdout to the display
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging already initialized: {}", e);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("=== Signal Device v{} ===", env!("CARGO_PKG_VERSION"));
    let config = DeviceConfig::load()?;

    let adc = SimulatedAdc::new(config.simulation.clone(), config.calibration)?;
    let reader = PeripheralReader::new(adc, config.calibration)?;
    let server = TcpSampleServer::bind(&config.listen).await?;
    let scheduler = DeviceScheduler::new(reader, ConsoleDisplay::stdout(), SchedulerConfig::from(&config));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Interrupt received, stopping");
    };

    let report = tokio::task::LocalSet::new()
        .run_until(scheduler.run(server, shutdown))
        .await;

    match report.transmit {
        TransmitStatus::Running => info!("Stopped cleanly after {} reads", report.reads),
        TransmitStatus::Failed(e) => warn!("Stopped after {} reads; transmit had failed: {}", report.reads, e),
        TransmitStatus::Aborted(e) => warn!("Stopped after {} reads; transmit aborted: {}", report.reads, e),
    }

    Ok(())
}
