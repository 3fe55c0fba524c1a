//! Integration tests for the analysis API endpoints

use analysis_lib::{AnalysisConfig, AnalysisService, MemorySource, TelemetryRecord};
use analysis_server::api::{create_router, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const T0: i64 = 1_700_000_000;

fn record(job_id: u64, component_id: u64, timestamp: i64, available: f64) -> TelemetryRecord {
    TelemetryRecord {
        job_id,
        component_id,
        timestamp,
        values: [
            ("MemTotal".to_string(), 1000.0),
            ("MemAvailable".to_string(), available),
        ]
        .into_iter()
        .collect(),
    }
}

fn test_router() -> Router {
    let mut records = Vec::new();
    for component in 1..=3u64 {
        for i in 0..4 {
            records.push(record(7, component, T0 + i, component as f64 * 100.0));
        }
    }
    for component in 20..=23u64 {
        records.push(record(0, component, T0, 1000.0 - (component - 19) as f64 * 100.0));
    }
    let source = MemorySource::new()
        .with_records("meminfo", &records)
        .with_job("mt-slurm", 7, T0, T0 + 3);

    let service = AnalysisService::new(Arc::new(source), AnalysisConfig::default());
    create_router(Arc::new(AppState::new(service)))
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_healthz_endpoint() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_series_envelope() {
    let (status, body) = post_json(
        test_router(),
        "/series",
        json!({"metric": "MemAvailable", "job_id": 7, "start": T0, "end": T0 + 3}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let series = body.as_array().unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series[0]["target"], "min_MemAvailable");
    assert_eq!(series[1]["target"], "mean_MemAvailable");
    assert_eq!(series[2]["target"], "max_MemAvailable");
    assert_eq!(series[0]["datapoints"][0], json!([100.0, T0 * 1000]));
    assert_eq!(series[1]["datapoints"][3], json!([200.0, (T0 + 3) * 1000]));
    assert_eq!(series[2]["datapoints"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_series_without_job_is_sentinel() {
    let (status, body) = post_json(
        test_router(),
        "/series",
        json!({"metric": "MemAvailable", "job_id": 0, "start": T0, "end": T0 + 3}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"target": "Error: Please specify valid job_id", "datapoints": []}])
    );
}

#[tokio::test]
async fn test_ranking_idle_top() {
    let (status, body) = post_json(
        test_router(),
        "/ranking",
        json!({"start": T0, "params": "idle,threshold=1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let columns = body["columns"].as_array().unwrap();
    let ids = columns
        .iter()
        .find(|c| c["name"] == "component_id")
        .unwrap();
    // idle ratios 0.1..0.4, keep those above sorted[2]
    assert_eq!(ids["values"], json!([23]));
}

#[tokio::test]
async fn test_ranking_summary() {
    let (status, body) = post_json(
        test_router(),
        "/ranking",
        json!({"job_id": 7, "start": 0, "params": "summary"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let columns = body["columns"].as_array().unwrap();
    let analysis = columns.iter().find(|c| c["name"] == "Analysis").unwrap();
    assert_eq!(
        analysis["values"],
        json!(["Min", "Max", "Stdd-2", "Stdd-1", "Mean", "Stdd+1", "Stdd+2"])
    );
}

#[tokio::test]
async fn test_ranking_bad_params_is_sentinel() {
    let (status, body) = post_json(
        test_router(),
        "/ranking",
        json!({"start": 0, "params": "threshold=many"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let target = body[0]["target"].as_str().unwrap();
    assert!(target.starts_with("Error: "));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = test_router();
    post_json(
        app.clone(),
        "/series",
        json!({"metric": "MemAvailable", "job_id": 7, "start": T0, "end": T0 + 3}),
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    assert!(body_str.contains("memory_analysis_requests_total"));
}
