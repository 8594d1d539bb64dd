//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    middleware::describe_limit,
    types::{
        BuildRequest, ErrorResponse, HealthResponse, Limits, RubricResponse, ValidateRequest,
        ValidateResponse,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use skillgraph_core::{Ingestor, SkillGraphError};

const INVALID_JSON: &str = "Invalid JSON body.";
const INTERNAL_ERROR: &str = "Validation failed due to an internal error.";
const BUILD_ERROR: &str = "Build failed due to an internal error.";

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a pipeline error.
pub fn error_status(err: &SkillGraphError) -> StatusCode {
    match err {
        SkillGraphError::NoDocuments
        | SkillGraphError::InvalidGraph(_)
        | SkillGraphError::SerializationError(_) => StatusCode::BAD_REQUEST,
        SkillGraphError::TooManyDocuments { .. }
        | SkillGraphError::CorpusTooLarge { .. }
        | SkillGraphError::GraphTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        SkillGraphError::IoError(_) | SkillGraphError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn pipeline_error(err: &SkillGraphError) -> Response {
    tracing::warn!("Rejected request: {}", err);
    error_response(error_status(err), err.to_string())
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// VALIDATE HANDLERS
// =============================================================================

/// Score a submitted graph against the rubric.
///
/// Degrees, metrics and clusters are recomputed from the submitted edges;
/// any supplied values are ignored.
pub async fn validate_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Rejecting malformed validation body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, INVALID_JSON);
        }
    };

    let request = match ValidateRequest::from_json(body, state.config.max_nodes) {
        Ok(request) => request,
        Err(e) => return pipeline_error(&e),
    };

    let validator = state.validator.clone();
    let ValidateRequest {
        graph_id,
        nodes,
        edges,
    } = request;
    let scored = tokio::task::spawn_blocking(move || validator.validate(&nodes, &edges)).await;

    match scored {
        Ok(report) => {
            tracing::info!(
                score = report.score,
                grade = %report.grade,
                nodes = report.metrics.node_count,
                "Validated graph"
            );
            no_store((StatusCode::OK, Json(ValidateResponse::new(graph_id, report))).into_response())
        }
        Err(e) => {
            tracing::error!("Validation task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

/// Describe the validation endpoint, its rubric and its limits.
pub async fn rubric_handler(State(state): State<AppState>) -> impl IntoResponse {
    let rate_limit = match state.client_limiter.as_ref() {
        Some(store) => format!("{} per IP", describe_limit(store.limit(), store.window())),
        None => "unlimited".to_string(),
    };

    let response = RubricResponse {
        endpoint: "POST /validate".to_string(),
        description: "Scores a skill graph 0-100 for structural quality. Send { graph } or \
                      the graph object itself with nodes and edges arrays."
            .to_string(),
        rubric: state.validator.rubric().describe(),
        limits: Limits {
            max_nodes: state.config.max_nodes,
            rate_limit,
        },
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// BUILD HANDLER
// =============================================================================

/// Build a skill graph from a submitted markdown corpus.
pub async fn build_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: BuildRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejecting malformed build body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, INVALID_JSON);
        }
    };

    let documents = match Ingestor::admit(request.documents) {
        Ok(documents) => documents,
        Err(e) => return pipeline_error(&e),
    };

    let builder = state.builder.clone();
    match tokio::task::spawn_blocking(move || builder.build(&documents)).await {
        Ok(graph) => no_store((StatusCode::OK, Json(graph)).into_response()),
        Err(e) => {
            tracing::error!("Build task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, BUILD_ERROR)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&SkillGraphError::NoDocuments),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&SkillGraphError::GraphTooLarge { count: 2, max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            error_status(&SkillGraphError::CorpusTooLarge { bytes: 2, max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            error_status(&SkillGraphError::IoError("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
