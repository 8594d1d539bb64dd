//! # Skill Graph HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /validate` - Describe the validation endpoint and its rubric
//! - `POST /validate` - Score a skill graph
//! - `POST /build` - Build a skill graph from a markdown corpus
//!
//! ## Security Configuration
//!
//! See [`crate::config`] for the rate limit, node ceiling and CORS settings.

mod handlers;
mod middleware;
mod types;

pub use handlers::{
    build_handler, error_status, health_handler, rubric_handler, validate_handler,
};
pub use middleware::{
    FixedWindowStore, GlobalRateLimiter, RateDecision, RateLimitStore, UNKNOWN_CLIENT,
    client_identity, create_rate_limiter, describe_limit,
};
pub use types::{
    BuildRequest, ErrorResponse, HealthResponse, Limits, RubricResponse, ValidateRequest,
    ValidateResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use skillgraph_core::{GraphBuilder, SkillGraphError, Validator};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub validator: Arc<Validator>,
    pub builder: Arc<GraphBuilder>,
    /// Per-client limiter for the POST endpoints; `None` disables it.
    pub client_limiter: Option<Arc<dyn RateLimitStore>>,
}

impl AppState {
    /// Create state with the default rubric and an in-memory client limiter.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let store = FixedWindowStore::new(config.rate_limit, config.rate_window());
        Self::with_store(config, Some(Arc::new(store)))
    }

    /// Create state with a caller-supplied limiter store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: Option<Arc<dyn RateLimitStore>>) -> Self {
        Self {
            config: Arc::new(config),
            validator: Arc::new(Validator::new()),
            builder: Arc::new(GraphBuilder::new()),
            client_limiter: store,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: a comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Global rate limiting (if enabled)
/// 5. Per-client rate limiting, on the POST endpoints only
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_origins.as_deref());
    let body_limit = state.config.body_limit_bytes;

    let global_rps = state.config.global_rps;
    let rate_limiter = if global_rps > 0 {
        tracing::info!("Global rate limiting enabled: {} requests/second", global_rps);
        Some(create_rate_limiter(global_rps))
    } else {
        tracing::info!("Global rate limiting disabled");
        None
    };
    match state.client_limiter.as_ref() {
        Some(store) => tracing::info!(
            "Client rate limiting enabled: {}",
            describe_limit(store.limit(), store.window())
        ),
        None => tracing::info!("Client rate limiting disabled"),
    }

    let client_limit =
        axum_middleware::from_fn_with_state(state.clone(), middleware::client_rate_limit_middleware);

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/validate",
            get(handlers::rubric_handler)
                .merge(post(handlers::validate_handler).route_layer(client_limit.clone())),
        )
        .route(
            "/build",
            post(handlers::build_handler).route_layer(client_limit),
        );

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(config: ServerConfig) -> Result<(), SkillGraphError> {
    let addr = config.addr();
    let router = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SkillGraphError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Skill graph server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| SkillGraphError::IoError(format!("Server error: {}", e)))
}
