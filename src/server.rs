//! Web server module.
//!
//! Provides the employee read API and the health probe endpoints over the
//! query and health facades.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::health::{DetailedHealth, HealthMonitor, Readiness};
use crate::query::{QueryError, QueryService, SkillMatch};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
    pub health: HealthMonitor,
}

// =============================================================================
// Response envelopes
// =============================================================================

/// Error envelope: machine status, short tag, human message.
#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
    message: String,
}

/// Employee collection response.
#[derive(Serialize)]
struct ListResponse {
    status: u16,
    data: Vec<Value>,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Single employee response.
#[derive(Serialize)]
struct RecordResponse {
    status: u16,
    data: Value,
}

/// Skill search response.
#[derive(Serialize)]
struct SearchResponse {
    status: u16,
    requested_skills: Vec<String>,
    data: Vec<SkillMatch>,
    count: usize,
}

/// Basic health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Detailed health response with component breakdown.
#[derive(Serialize)]
struct DetailedResponse {
    status: &'static str,
    components: DetailedHealth,
}

/// Liveness probe response.
#[derive(Serialize)]
struct LiveResponse {
    status: &'static str,
}

/// Readiness probe response.
#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    #[serde(flatten)]
    report: Readiness,
}

// =============================================================================
// Error mapping
// =============================================================================

/// HTTP-facing error carrying the envelope fields.
struct ApiError {
    status: StatusCode,
    tag: &'static str,
    message: String,
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound(id) => Self {
                status: StatusCode::NOT_FOUND,
                tag: "NOT_FOUND",
                message: format!("Employee with ID {id} not found"),
            },
            QueryError::BadRequest(message) => Self {
                status: StatusCode::BAD_REQUEST,
                tag: "BAD_REQUEST",
                message,
            },
            QueryError::Store(e) => {
                tracing::error!(error = %e, "Store failure while serving request");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    tag: "INTERNAL_SERVER_ERROR",
                    message: e.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self.tag,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/v1/employees", get(list_employees_handler))
        .route("/v1/employees/{id}", get(get_employee_handler))
        .route("/v1/employees/search/by-skills", get(search_by_skills_handler))
        .route("/health", get(health_handler))
        .route("/health/detailed", get(health_detailed_handler))
        .route("/health/live", get(health_live_handler))
        .route("/health/ready", get(health_ready_handler))
        .fallback(not_found_handler)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Turn a handler panic into the standard 500 envelope.
fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        tag: "INTERNAL_SERVER_ERROR",
        message: "Internal server error".to_string(),
    }
    .into_response()
}

// =============================================================================
// Employee handlers
// =============================================================================

/// GET /v1/employees - fetch all employee records.
async fn list_employees_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListResponse>, ApiError> {
    let employees = state.query.list_employees().await?;
    let message = employees.is_empty().then_some("No employees found");
    Ok(Json(ListResponse {
        status: 200,
        count: employees.len(),
        data: employees,
        message,
    }))
}

/// GET /v1/employees/{id} - fetch one employee record.
async fn get_employee_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let record = state.query.get_employee(&id).await?;
    Ok(Json(RecordResponse {
        status: 200,
        data: record,
    }))
}

/// Query parameters for the skill search endpoint.
#[derive(Debug, Deserialize)]
struct SearchParams {
    skills: Option<String>,
}

/// GET /v1/employees/search/by-skills?skills=a,b - employees with ALL skills.
async fn search_by_skills_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let skills_csv = params.skills.unwrap_or_default();
    let result = state.query.search_by_skills(&skills_csv).await?;
    Ok(Json(SearchResponse {
        status: 200,
        requested_skills: result.requested,
        count: result.matches.len(),
        data: result.matches,
    }))
}

// =============================================================================
// Health handlers
// =============================================================================

/// GET /health - basic store connectivity check.
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.health.liveness().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy",
            store: "connected",
            error: None,
        })
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                store: "disconnected",
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// GET /health/detailed - component breakdown with latency and counts.
async fn health_detailed_handler(State(state): State<Arc<AppState>>) -> Response {
    let report = state.health.detailed().await;
    let code = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = DetailedResponse {
        status: if report.healthy { "healthy" } else { "unhealthy" },
        components: report,
    };
    (code, Json(body)).into_response()
}

/// GET /health/live - liveness probe.
async fn health_live_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.health.liveness().await {
        Ok(()) => Json(LiveResponse { status: "alive" }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Liveness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(LiveResponse { status: "dead" }),
            )
                .into_response()
        }
    }
}

/// GET /health/ready - readiness probe gated on data presence.
async fn health_ready_handler(State(state): State<Arc<AppState>>) -> Response {
    let report = state.health.readiness().await;
    if report.ready {
        Json(ReadyResponse {
            status: "ready",
            report,
        })
        .into_response()
    } else {
        tracing::warn!(reason = ?report.reason, "Readiness check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not_ready",
                report,
            }),
        )
            .into_response()
    }
}

/// Fallback for unmatched routes.
async fn not_found_handler() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        tag: "NOT_FOUND",
        message: "Endpoint not found".to_string(),
    }
}
