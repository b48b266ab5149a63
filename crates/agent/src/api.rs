//! HTTP API for analysis, health checks and Prometheus metrics

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{
    health::{ComponentStatus, HealthRegistry},
    root_cause::DependencyEdge,
    service::{MonitorError, MonitorService},
    AlertDecision, DiskInfo, RootCauseResult, Sample, TrendAnalysis,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// Number of samples returned by `/metrics/recent` when no count is given
const DEFAULT_RECENT_COUNT: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub service: Arc<MonitorService>,
    pub history_window: Duration,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        service: Arc<MonitorService>,
        history_window: Duration,
    ) -> Self {
        Self {
            health_registry,
            service,
            history_window,
        }
    }
}

/// Error returned by the API handlers as a JSON `{error}` body
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::InvalidSample(_) | MonitorError::InvalidWindow(_) => {
                ApiError::BadRequest(err.to_string())
            }
            MonitorError::NoSamples { .. } => ApiError::NotFound(err.to_string()),
            MonitorError::Store(_) | MonitorError::Collection(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Body of `POST /api/v1/alerts/check`
#[derive(Debug, Deserialize)]
pub struct AlertCheckRequest {
    pub entity: String,
    pub cpu: f64,
    pub mem: f64,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

/// Body of `POST /api/v1/diagnose`
#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    pub current: Sample,
    #[serde(default)]
    pub history: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub window_secs: Option<u64>,
}

/// Store a sample and return the threshold decision, if one was made
async fn ingest_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<Sample>,
) -> ApiResult<Option<AlertDecision>> {
    Ok(Json(state.service.ingest(sample)?))
}

async fn latest_samples(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Sample>> {
    Ok(Json(state.service.latest()?))
}

async fn recent_samples(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Vec<Sample>> {
    let count = query.count.unwrap_or(DEFAULT_RECENT_COUNT);
    Ok(Json(state.service.recent(count)?))
}

async fn check_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AlertCheckRequest>,
) -> ApiResult<AlertDecision> {
    if req.entity.trim().is_empty() {
        return Err(ApiError::BadRequest("entity must not be empty".into()));
    }
    if !req.cpu.is_finite() || !req.mem.is_finite() {
        return Err(ApiError::BadRequest("cpu and mem must be numbers".into()));
    }

    Ok(Json(state.service.check_alert(
        &req.entity,
        req.cpu,
        req.mem,
        req.response_time_ms,
    )))
}

/// Run a collector-backed service call on the blocking pool
async fn with_collector<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&MonitorService) -> T + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError::Internal(format!("collector task failed: {e}")))
}

async fn root_cause(
    State(state): State<Arc<AppState>>,
    Path(component): Path<String>,
) -> ApiResult<RootCauseResult> {
    let result = with_collector(&state, move |service| {
        service.analyze_root_cause(&component)
    })
    .await?;
    Ok(Json(result))
}

async fn diagnose_explicit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiagnoseRequest>,
) -> Json<TrendAnalysis> {
    Json(state.service.analyze(&req.current, &req.history))
}

async fn diagnose_component(
    State(state): State<Arc<AppState>>,
    Path(component): Path<String>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<TrendAnalysis> {
    let window = match query.window_secs {
        Some(0) => return Err(ApiError::BadRequest("window_secs must be positive".into())),
        Some(secs) => Duration::from_secs(secs),
        None => state.history_window,
    };

    Ok(Json(state.service.diagnose(&component, window)?))
}

async fn topology(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DependencyEdge>> {
    Ok(Json(with_collector(&state, MonitorService::topology).await??))
}

async fn disks(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DiskInfo>> {
    Ok(Json(with_collector(&state, MonitorService::disks).await??))
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {e}")))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/metrics", post(ingest_sample))
        .route("/api/v1/metrics/latest", get(latest_samples))
        .route("/api/v1/metrics/recent", get(recent_samples))
        .route("/api/v1/alerts/check", post(check_alert))
        .route("/api/v1/root-cause/:component", get(root_cause))
        .route("/api/v1/diagnose", post(diagnose_explicit))
        .route("/api/v1/diagnose/:component", get(diagnose_component))
        .route("/api/v1/topology", get(topology))
        .route("/api/v1/disks", get(disks))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
