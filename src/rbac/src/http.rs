//! HTTP check API
//!
//! ## Endpoints
//!
//! - `POST /v1/check` - Access check against a section or explicit role set
//! - `POST /v1/landing` - Landing path for a role set
//! - `GET /v1/policy` - Loaded policy table
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics

use crate::engine::{DecisionReason, LandingReason, RbacEngine};
use crate::error::RbacError;
use crate::policy::PolicyTable;
use crate::types::{Path, RequiredRoleSet, RoleSet};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RbacEngine>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(engine: Arc<RbacEngine>) -> Self {
        Self {
            engine,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<RbacError> for AppError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::SectionNotFound(_) | RbacError::InvalidInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Access check request
///
/// Exactly one of `section` or `required` must be given.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub roles: RoleSet,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub required: Option<RequiredRoleSet>,
}

/// Access check response
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub decision: String,
    pub reason: DecisionReason,
    pub decision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_to: Option<Path>,
    pub timestamp: i64,
}

/// Landing request
#[derive(Debug, Deserialize)]
pub struct LandingRequest {
    #[serde(default)]
    pub roles: RoleSet,
}

/// Landing response
#[derive(Debug, Serialize, Deserialize)]
pub struct LandingResponse {
    pub path: Path,
    pub reason: LandingReason,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    version: String,
}

/// Metrics response (Prometheus format)
struct MetricsResponse {
    metrics: String,
}

impl IntoResponse for MetricsResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            self.metrics,
        )
            .into_response()
    }
}

/// POST /v1/check - Check access
async fn check_access(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, AppError> {
    let engine = &state.engine;

    let (decision, deny_path) = match (req.section.as_deref(), req.required) {
        (Some(section), None) => {
            let decision = engine.check_section(&req.roles, section)?;
            let deny_path = engine
                .table()
                .section(section)
                .map(|s| engine.table().deny_path(s));
            (decision, deny_path)
        }
        (None, Some(required)) => {
            let decision = engine.check(&req.roles, &required);
            (decision, Some(engine.table().routes().unauthorized.clone()))
        }
        _ => {
            return Err(RbacError::InvalidInput(
                "exactly one of 'section' or 'required' must be set".to_string(),
            )
            .into())
        }
    };

    info!(
        "Access check: roles={:?} -> {}",
        req.roles, decision.verdict
    );

    Ok(Json(CheckResponse {
        allowed: decision.allowed(),
        decision: decision.verdict.to_string(),
        navigate_to: if decision.allowed() { None } else { deny_path },
        reason: decision.reason,
        decision_id: decision.id,
        timestamp: decision.timestamp,
    }))
}

/// POST /v1/landing - Resolve landing path
async fn resolve_landing(
    State(state): State<AppState>,
    Json(req): Json<LandingRequest>,
) -> Json<LandingResponse> {
    let decision = state.engine.landing(&req.roles);

    Json(LandingResponse {
        path: decision.path,
        reason: decision.reason,
    })
}

/// GET /v1/policy - Loaded policy table
async fn policy_table(State(state): State<AppState>) -> Json<PolicyTable> {
    Json(state.engine.table().as_ref().clone())
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
    })
}

/// GET /metrics - Prometheus metrics endpoint
async fn metrics(State(state): State<AppState>) -> MetricsResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let mut metrics = format!(
        "# HELP rbac_uptime_seconds Server uptime in seconds\n\
         # TYPE rbac_uptime_seconds gauge\n\
         rbac_uptime_seconds {}\n\n",
        uptime
    );
    if let Some(collector) = state.engine.metrics() {
        metrics.push_str(&collector.export_prometheus());
    }

    MetricsResponse { metrics }
}

/// Create the HTTP router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/v1/check", post(check_access))
        .route("/v1/landing", post(resolve_landing))
        .route("/v1/policy", get(policy_table))
        .route("/health", get(health_check))
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}

/// Create the metrics router
pub fn create_metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(state)
}
