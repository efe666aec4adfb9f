//! HTTP surface of the matcher plus helpers shared by the binaries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use tracing_subscriber::{fmt, EnvFilter};

use resumedb_core::types::ResumeChunk;
use resumedb_core::Error;
use resumedb_match::{MatchReport, ResumeMatcher};

/// Service context built once at startup and shared by every handler.
pub struct AppState {
    pub matcher: Arc<ResumeMatcher>,
    pub llm_backend: String,
    pub default_top_k: usize,
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_id: String,
    pub job_description: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub job_description: String,
    pub resume_chunks: Vec<ResumeChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_backend: String,
}

/// Failure payload. Sent with HTTP 200 so clients branch on `status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
}

pub struct ApiError(String);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        if e.is_request_scoped() {
            warn!(error = %e, "request failed")
        } else {
            error!(error = %e, "request failed")
        }
        Self(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(ErrorBody { status: "error".to_string(), message: self.0 }).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);
    Router::new()
        .route("/health", get(health))
        .route("/match", post(match_handler))
        .route("/explain-match", post(explain_handler))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.trim().parse().ok()).collect();
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if parsed.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), llm_backend: state.llm_backend.clone() })
}

async fn match_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, ApiError> {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    let work = state.matcher.match_job(&req.job_id, &req.job_description, top_k);
    let report = with_timeout(state.request_timeout, work).await?;
    Ok(Json(report))
}

async fn explain_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let work = state.matcher.explain(&req.job_description, &req.resume_chunks);
    let explanation = with_timeout(state.request_timeout, work).await?;
    Ok(Json(ExplainResponse { explanation }))
}

/// Drops `work` when `limit` passes, which abandons any backend calls still
/// in flight.
async fn with_timeout<T>(
    limit: Duration,
    work: impl Future<Output = resumedb_core::Result<T>>,
) -> resumedb_core::Result<T> {
    tokio::time::timeout(limit, work).await.map_err(|_| {
        Error::ExternalService(format!("request timed out after {:?}", limit))
    })?
}

/// Install the fmt subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
