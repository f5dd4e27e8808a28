//! Signal Host Server
//!
//! Buffers the device's sample stream and serves periodograms on demand.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ingestion_buffer::{BufferStats, IngestionBuffer, IngestionLoop};
use metrics_exporter_prometheus::PrometheusHandle;
use sample_transport::RecordSource;
use serde::Serialize;
use spectral_estimator::{SpectralError, SpectralEstimator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod routes;

pub use config::{ConfigError, DeviceEndpoint, HostConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Inbound record buffer
    pub buffer: Arc<IngestionBuffer>,
    /// Drain-only consumer of the buffer
    pub estimator: Arc<SpectralEstimator>,
    /// Whether the ingestion loop is still receiving
    pub ingestion_active: Arc<AtomicBool>,
    /// Prometheus exposition, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the buffer and estimator from configuration
    pub fn new(config: &HostConfig, metrics: Option<PrometheusHandle>) -> Result<Self, SpectralError> {
        let buffer = Arc::new(IngestionBuffer::new(config.max_queue_size));
        let estimator = SpectralEstimator::new(Arc::clone(&buffer), config.estimator_config())?;
        Ok(Self {
            buffer,
            estimator: Arc::new(estimator),
            ingestion_active: Arc::new(AtomicBool::new(false)),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }
}

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub ingestion: IngestionHealth,
    pub buffer: BufferStats,
}

/// Ingestion loop health
#[derive(Debug, Serialize)]
pub struct IngestionHealth {
    pub running: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

    Router::new()
        .route("/periodogram", get(routes::periodogram::get_periodogram))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let running = state.ingestion_active.load(Ordering::Acquire);

    Json(HealthResponse {
        status: (if running { "healthy" } else { "degraded" }).to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        ingestion: IngestionHealth { running },
        buffer: state.buffer.stats(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Run the ingestion loop on `source` in the background
///
/// The health endpoint reports ingestion as stopped once the loop ends.
pub fn spawn_ingestion<R>(state: &AppState, source: R) -> JoinHandle<()>
where
    R: RecordSource + 'static,
{
    let buffer = Arc::clone(&state.buffer);
    let active = Arc::clone(&state.ingestion_active);
    active.store(true, Ordering::Release);

    tokio::spawn(async move {
        let outcome = IngestionLoop::new(source, buffer).run().await;
        active.store(false, Ordering::Release);
        warn!(
            "Ingestion ended ({} records, {} malformed); restart the host to reconnect",
            outcome.received, outcome.malformed
        );
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        warn!("Logging already initialized: {}", e);
    }
}

/// Serve HTTP until Ctrl-C
pub async fn run_server(state: Arc<AppState>, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            info!("Interrupt received, shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sample_transport::{channel, Record, SampleSink};
    use tower::ServiceExt;

    fn state(capacity: usize) -> Arc<AppState> {
        let config = HostConfig {
            max_queue_size: capacity,
            ..Default::default()
        };
        Arc::new(AppState::new(&config, None).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_buffer() {
        let state = state(123);
        state.buffer.push(Record::new(0, 1.0));

        let (status, body) = get_json(create_router(state), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["ingestion"]["running"], false);
        assert_eq!(body["buffer"]["len"], 1);
        assert_eq!(body["buffer"]["capacity"], 123);
        assert_eq!(body["buffer"]["totalPushed"], 1);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = create_router(state(10))
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ingestion_feeds_buffer() {
        let state = state(3);
        let (mut sink, source) = channel(16);
        let handle = spawn_ingestion(&state, source);
        assert!(state.ingestion_active.load(Ordering::Acquire));

        for n in 0..5 {
            sink.send(&Record::new(n, 0.1)).await.unwrap();
        }
        drop(sink);
        handle.await.unwrap();

        assert!(!state.ingestion_active.load(Ordering::Acquire));
        let stats = state.buffer.stats();
        assert_eq!(stats.len, 3);
        assert_eq!(stats.total_evicted, 2);
    }
}
