//! JSON HTTP API over the aggregator.
//!
//! Lets the chat front-end (or anything else) ask for context fragments
//! without linking the crate.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/retrieve` | `{ "query": "..." }` → `{ "fragments": [...] }` |
//! | `GET`  | `/sources` | Health of every registered source |
//! | `GET`  | `/health` | Liveness check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Source failures never surface here: a source that errors simply
//! contributes no fragments.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based
//! dashboards can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::models::Fragment;
use crate::sources::{source_statuses, SourceStatus};
use crate::unanswered;

#[derive(Clone)]
struct AppState {
    aggregator: Arc<Aggregator>,
    /// Where to log queries that produced nothing, if anywhere.
    unanswered: Option<Arc<PathBuf>>,
}

/// Build the sources from `config`, warm them up, and serve until the
/// process is terminated.
///
/// A warm-up failure (for example an unreadable off-game corpus) aborts
/// startup.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let aggregator = Arc::new(Aggregator::from_config(config)?);
    aggregator.warm_up().await?;
    run_server_with_aggregator(config, aggregator).await
}

/// Serve an already-built aggregator, for binaries that register their
/// own sources.
///
/// # Example
///
/// ```rust,no_run
/// use knowledge_harness::aggregate::Aggregator;
/// use knowledge_harness::server::run_server_with_aggregator;
/// use knowledge_harness::traits::SourceRegistry;
/// use std::sync::Arc;
///
/// # async fn example(config: &knowledge_harness::config::Config) -> anyhow::Result<()> {
/// let mut sources = SourceRegistry::new();
/// // sources.register(Arc::new(MySource::new()));
/// let aggregator = Aggregator::new(sources, config.retrieval.clone());
/// run_server_with_aggregator(config, Arc::new(aggregator)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_aggregator(
    config: &Config,
    aggregator: Arc<Aggregator>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let unanswered = config.unanswered.as_ref().map(|u| u.path.clone());

    for source in aggregator.registry().sources() {
        tracing::info!(source = source.name(), kind = %source.kind(), "source registered");
    }

    let app = router(aggregator, unanswered);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API routes with CORS applied.
pub fn router(aggregator: Arc<Aggregator>, unanswered: Option<PathBuf>) -> Router {
    let state = AppState {
        aggregator,
        unanswered: unanswered.map(Arc::new),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/retrieve", post(handle_retrieve))
        .route("/sources", get(handle_sources))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /sources ============

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<SourceStatus>,
}

async fn handle_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: source_statuses(state.aggregator.registry()).await,
    })
}

// ============ POST /retrieve ============

#[derive(Deserialize)]
struct RetrieveRequest {
    query: String,
}

#[derive(Serialize)]
struct RetrieveResponse {
    fragments: Vec<Fragment>,
}

/// Returns `400` for an empty query. An empty fragment list is a normal
/// `200` and is also written to the unanswered log when one is configured.
async fn handle_retrieve(
    State(state): State<AppState>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let fragments = state.aggregator.retrieve_all(query).await;

    if fragments.is_empty() {
        if let Some(path) = &state.unanswered {
            if let Err(e) = unanswered::record(path, query).await {
                tracing::warn!(error = %e, "failed to log unanswered query");
            }
        }
    }

    Ok(Json(RetrieveResponse { fragments }))
}
