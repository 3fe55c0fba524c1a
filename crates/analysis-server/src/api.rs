//! HTTP API for analysis queries, health checks and Prometheus metrics

use analysis_lib::{AnalysisService, OutputSeries, QueryResponse, TimeWindow};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub started_at: i64,
}

impl AppState {
    pub fn new(service: AnalysisService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Body of `POST /series`
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesRequest {
    pub metric: String,
    pub job_id: u64,
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    pub max_components: Option<usize>,
}

/// Body of `POST /ranking`
#[derive(Debug, Clone, Deserialize)]
pub struct RankingRequest {
    #[serde(default)]
    pub job_id: u64,
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    /// Free-form options, e.g. `"idle,threshold=-3"` or `"summary"`
    #[serde(default)]
    pub params: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    started_at: i64,
}

async fn series(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SeriesRequest>,
) -> Json<Vec<OutputSeries>> {
    let window = TimeWindow::new(request.start, request.end);
    Json(
        state
            .service
            .get_series(&request.metric, request.job_id, window, request.max_components)
            .await,
    )
}

async fn ranking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RankingRequest>,
) -> Json<QueryResponse> {
    let window = TimeWindow::new(request.start, request.end);
    Json(
        state
            .service
            .get_ranking(request.job_id, window, &request.params)
            .await,
    )
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            started_at: state.started_at,
        }),
    )
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/series", post(series))
        .route("/ranking", post(ranking))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
