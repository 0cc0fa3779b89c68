//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Liveness check, always `{"status": "ok"}` |
//! | `POST` | `/reindex` | Rebuild the index from the document root |
//! | `POST` | `/query` | Answer a question from the indexed documents |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "model_error", "message": "Query failed: model inference failed: ..." } }
//! ```
//!
//! Request validation failures return 422 with code `validation_error`.
//! Every pipeline failure returns 500; the code tells them apart
//! (`query_syntax`, `model_error`, `timeout`, `internal`).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::Config;
use crate::db;
use crate::error::RagError;
use crate::ingest::Retriever;
use crate::llm::{LanguageModel, LlamaServerModel};
use crate::models::{Answer, ReindexStatus};
use crate::query::{QueryEngine, QuerySettings};
use crate::sqlite_store::SqliteStore;

/// Minimum number of characters in a question.
pub const MIN_QUESTION_LEN: usize = 3;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    retriever: Arc<Retriever>,
    engine: Arc<QueryEngine>,
    default_top_k: i64,
    max_top_k: i64,
}

impl AppState {
    pub fn new(config: &Config, retriever: Arc<Retriever>, model: Arc<dyn LanguageModel>) -> Self {
        let engine = QueryEngine::new(model, retriever.clone(), QuerySettings::from_config(config));
        Self {
            retriever,
            engine: Arc::new(engine),
            default_top_k: config.retrieval.default_top_k,
            max_top_k: config.retrieval.max_top_k,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/reindex", post(handle_reindex))
        .route("/query", post(handle_query))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open the index, run the startup indexing check, and serve until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let db_missing = db::is_missing_or_empty(&config.db.path);
    let store = Arc::new(SqliteStore::open(&config.db.path).await?);
    let retriever = Arc::new(Retriever::from_config(store, config));

    if retriever.needs_initial_index(db_missing).await? {
        tracing::info!("index database is missing or empty, running initial indexing");
        let outcome = retriever.reindex().await?;
        tracing::info!(status = ?outcome.status, chunks = outcome.chunks, "{}", outcome.message);
    } else {
        tracing::info!(path = %config.db.path.display(), "index database found, skipping initial indexing");
    }

    let model: Arc<dyn LanguageModel> = Arc::new(LlamaServerModel::new(&config.model)?);
    let app = build_router(AppState::new(config, retriever, model));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
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

fn validation_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "validation_error".to_string(),
        message: message.into(),
    }
}

/// Every pipeline failure is a 500; the code carries the category.
fn pipeline_error(context: &str, err: RagError) -> AppError {
    tracing::error!(error = %err, "{}", context);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: err.code().to_string(),
        message: format!("{}: {}", context, err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ============ POST /reindex ============

#[derive(Serialize)]
struct ReindexResponse {
    status: ReindexStatus,
    message: String,
    chunks_processed: usize,
}

async fn handle_reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>, AppError> {
    let outcome = state
        .retriever
        .reindex()
        .await
        .map_err(|e| pipeline_error("Reindex failed", e))?;

    Ok(Json(ReindexResponse {
        status: outcome.status,
        message: outcome.message,
        chunks_processed: outcome.chunks,
    }))
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
    top_k: Option<i64>,
}

async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Answer>, AppError> {
    let Json(request) = payload.map_err(|e| validation_error(e.body_text()))?;

    if request.question.chars().count() < MIN_QUESTION_LEN {
        return Err(validation_error(format!(
            "question must be at least {} characters",
            MIN_QUESTION_LEN
        )));
    }
    let top_k = request.top_k.unwrap_or(state.default_top_k);
    if !(1..=state.max_top_k).contains(&top_k) {
        return Err(validation_error(format!(
            "top_k must be between 1 and {}",
            state.max_top_k
        )));
    }

    let span = tracing::info_span!("query", request_id = %uuid::Uuid::new_v4(), top_k);
    let answer = state
        .engine
        .answer(&request.question, top_k)
        .instrument(span)
        .await
        .map_err(|e| pipeline_error("Query failed", e))?;

    Ok(Json(answer))
}
