//! Periodogram Route

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use spectral_estimator::{Periodogram, SpectralError};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::AppState;

/// Query parameters for the periodogram endpoint
#[derive(Debug, Deserialize)]
pub struct PeriodogramQuery {
    /// Overrides the configured sampling rate (Hz)
    #[serde(rename = "samplingRate")]
    pub sampling_rate: Option<f64>,
}

/// Structured error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: message.into(),
        })
    }
}

/// Drain the buffer and return its periodogram as a PNG
pub async fn get_periodogram(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PeriodogramQuery>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!("Rejected periodogram query: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, ErrorBody::new(rejection.body_text())).into_response();
        }
    };
    info!("/periodogram requested (samplingRate={:?})", params.sampling_rate);

    let estimator = Arc::clone(&state.estimator);
    let rate = params.sampling_rate;
    let result = tokio::task::spawn_blocking(move || estimator.periodogram(rate)).await;

    match result {
        Ok(Ok(Periodogram::Png(bytes))) => {
            info!("Periodogram generated ({} bytes)", bytes.len());
            ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
        }
        Ok(Ok(Periodogram::NoData)) => ErrorBody::new("No data available").into_response(),
        Ok(Err(e @ SpectralError::InvalidSamplingRate(_))) => {
            (StatusCode::BAD_REQUEST, ErrorBody::new(e.to_string())).into_response()
        }
        Ok(Err(e)) => {
            error!("Periodogram failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(e.to_string())).into_response()
        }
        Err(e) => {
            error!("Periodogram worker failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Periodogram worker failed")).into_response()
        }
    }
}
