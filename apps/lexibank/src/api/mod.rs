//! # Lexibank HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Bank, word and course counts
//! - `GET|POST /banks` - List or create banks
//! - `GET|POST /banks/{id}/words` - List or add words
//! - `GET /banks/{id}/stages` - Per-stage word counts
//! - `POST /banks/{id}/review` - Record recall results
//! - `GET /banks/{id}/due` - Words due for anti-forgetting review
//! - `GET /banks/{id}/grid` - Grid review layout
//! - `GET|POST /courses` - List or create courses
//! - `GET /courses/{id}/plan` - Course schedule
//! - `POST /export` - Export snapshot (base64)
//! - `GET /hash` - BLAKE3 hash of the snapshot
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `LEXIBANK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `LEXIBANK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `LEXIBANK_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use handlers::status_for;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    AddWordsRequest, AddWordsResponse, BankResponse, BankSummary, CourseResponse,
    CreateBankRequest, CreateCourseRequest, DayQuery, DueResponse, ErrorResponse, ExportResponse,
    GridQuery, GridResponse, HashResponse, HealthResponse, PlanResponse, RecallResult,
    ReviewRequest, ReviewResponse, StageCount, StagesResponse, StatusResponse, WordsResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use lexibank_core::{LexiError, Repository};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the repository.
#[derive(Clone)]
pub struct AppState {
    /// The repository holding banks, words and courses.
    pub repository: Arc<RwLock<Repository>>,
    /// Default cells per row for grid review.
    pub grid_columns: usize,
}

impl AppState {
    /// Create new app state with a repository.
    #[must_use]
    pub fn new(repository: Repository) -> Self {
        Self {
            repository: Arc::new(RwLock::new(repository)),
            grid_columns: 5,
        }
    }

    /// Override the default grid width.
    #[must_use]
    pub fn with_grid_columns(mut self, columns: usize) -> Self {
        self.grid_columns = columns;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `LEXIBANK_CORS_ORIGINS`.
///
/// - `"*"`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: the comma-separated origins that parse
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("LEXIBANK_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (LEXIBANK_CORS_ORIGINS=*). This is insecure for production!"
            );
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
                tracing::warn!(
                    "CORS: No valid origins in LEXIBANK_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No LEXIBANK_CORS_ORIGINS set, defaulting to localhost only");
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
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Body limit
/// 4. Rate Limiting - if enabled
/// 5. Authentication - if configured
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set LEXIBANK_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/banks",
            get(handlers::list_banks_handler).post(handlers::create_bank_handler),
        )
        .route(
            "/banks/{id}/words",
            get(handlers::list_words_handler).post(handlers::add_words_handler),
        )
        .route("/banks/{id}/stages", get(handlers::stages_handler))
        .route("/banks/{id}/review", post(handlers::review_handler))
        .route("/banks/{id}/due", get(handlers::due_handler))
        .route("/banks/{id}/grid", get(handlers::grid_handler))
        .route(
            "/courses",
            get(handlers::list_courses_handler).post(handlers::create_course_handler),
        )
        .route("/courses/{id}/plan", get(handlers::course_plan_handler))
        .route("/export", post(handlers::export_handler))
        .route("/hash", get(handlers::hash_handler));

    // Innermost: runs last on the request path
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `state` on `addr` until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), LexiError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LexiError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Lexibank HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LexiError::IoError(format!("Server error: {}", e)))?;

    tracing::info!("Lexibank HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
