//! HTTP API: public prediction/health/metrics routes and the admin listener

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use classifier_lib::{
    health::{ComponentStatus, HealthRegistry},
    ClassifierError, IrisRequest, IrisResponse, ModelStore, ModelSummary, PredictionService,
    RetrainScheduler,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const BANNER: &str = "Iris classifier service";

/// Shared state for the public listener
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(service: PredictionService, health_registry: HealthRegistry) -> Self {
        Self {
            service,
            health_registry,
        }
    }
}

/// Shared state for the admin listener
#[derive(Clone)]
pub struct AdminState {
    pub scheduler: Arc<RetrainScheduler>,
}

impl AdminState {
    pub fn new(scheduler: Arc<RetrainScheduler>) -> Self {
        Self { scheduler }
    }

    fn store(&self) -> &ModelStore {
        self.scheduler.pipeline().store()
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Classifier error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(ClassifierError);

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ClassifierError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClassifierError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifierError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Response body of a manual retrain
#[derive(Debug, Serialize, Deserialize)]
pub struct RetrainResponse {
    pub status: String,
    pub model: ModelSummary,
}

async fn banner() -> &'static str {
    BANNER
}

async fn classify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IrisRequest>, JsonRejection>,
) -> Result<Json<IrisResponse>, ApiError> {
    let Json(request) = payload?;
    let prediction = state.service.classify(&request)?;
    Ok(Json(prediction.into()))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving the previous model
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
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn retrain(State(state): State<Arc<AdminState>>) -> Result<Json<RetrainResponse>, ApiError> {
    let bundle = state.scheduler.trigger_refresh().await?;
    Ok(Json(RetrainResponse {
        status: "retrained".to_string(),
        model: bundle.summary(),
    }))
}

async fn model(State(state): State<Arc<AdminState>>) -> Result<Json<ModelSummary>, ApiError> {
    let bundle = state.store().current()?;
    Ok(Json(bundle.summary()))
}

/// Create the public router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/classify", get(banner))
        .route("/api/classify/irisRequest", post(classify))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Create the admin router
pub fn create_admin_router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/admin/retrain", post(retrain))
        .route("/admin/model", get(model))
        .with_state(state)
}

/// Serve a router until the shutdown signal fires
pub async fn serve(
    name: &'static str,
    addr: SocketAddr,
    router: Router,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    info!(listener = name, addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    info!(listener = name, "HTTP server stopped");
    Ok(())
}
