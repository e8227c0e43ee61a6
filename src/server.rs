//! HTTP server.
//!
//! Serves rating pages as JSON for the presentation layer and accepts the
//! scheduler's periodic ingestion trigger.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Ratings for `?date=YYYY-MM-DD` or `?from=&to=` (default: today, UTC) |
//! | `GET`, `POST` | `/cron` | Ingest the current ranking, then backfill details in the background |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Trigger authorization
//!
//! `/cron` only runs when one of `[server].trigger_headers` is present with
//! the value `true` (the scheduler sets it; clients cannot via the platform's
//! front end). Anything else gets `403`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "already_recorded", "message": "ranking already recorded for ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `already_recorded` (409),
//! `source_error` (502), `internal` (500).

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use topten_core::error::ArchiveError;
use topten_core::source::{DetailSource, RankingSource};
use topten_core::store::ArchiveStore;

use crate::config::Config;
use crate::db;
use crate::enrich;
use crate::ingest;
use crate::ratings::{self, RatingsPage};
use crate::scrape::{WebDetailSource, WebRankingSource};
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn ArchiveStore>,
    ranking: Arc<dyn RankingSource>,
    details: Arc<dyn DetailSource>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ArchiveStore>,
        ranking: Arc<dyn RankingSource>,
        details: Arc<dyn DetailSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            ranking,
            details,
        }
    }
}

/// Starts the server on `[server].bind` with the live HTTP collaborators.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState::new(
        config.clone(),
        Arc::new(SqliteStore::new(pool)),
        Arc::new(WebRankingSource::new(&config.source)?),
        Arc::new(WebDetailSource::new(&config.source)?),
    );

    let listener = TcpListener::bind(&config.server.bind).await?;
    serve(listener, state).await
}

/// Serve `state` on an already-bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_ratings))
        .route("/cron", get(handle_cron).post(handle_cron))
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
    code: &'static str,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
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

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        let message = err.to_string();
        if err.is_validation() {
            AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
        } else if err.is_conflict() {
            AppError::new(StatusCode::CONFLICT, "already_recorded", message)
        } else if matches!(err, ArchiveError::Source(_)) {
            AppError::new(StatusCode::BAD_GATEWAY, "source_error", message)
        } else {
            error!(error = %message, "storage failure");
            AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
        }
    }
}

// ============ GET / ============

#[derive(Debug, Deserialize)]
struct RatingsQuery {
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

async fn handle_ratings(
    State(state): State<AppState>,
    Query(q): Query<RatingsQuery>,
) -> Result<Json<RatingsPage>, AppError> {
    let (from, to) = ratings::resolve_range(q.date.as_deref(), q.from.as_deref(), q.to.as_deref())
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string()))?;

    let page = ratings::ratings_page(state.store.as_ref(), from, to).await?;
    Ok(Json(page))
}

// ============ /cron ============

#[derive(Serialize)]
struct CronResponse {
    status: &'static str,
    captured_at: String,
    recorded: usize,
    new_articles: usize,
}

fn is_trigger(config: &Config, headers: &HeaderMap) -> bool {
    config.server.trigger_headers.iter().any(|name| {
        headers
            .get(name.as_str())
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    })
}

async fn handle_cron(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, AppError> {
    if !is_trigger(&state.config, &headers) {
        warn!("rejected non-scheduler ingestion trigger");
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            "non cron request",
        ));
    }

    let report = ingest::ingest_once(
        &state.config,
        state.ranking.as_ref(),
        state.store.as_ref(),
        None,
    )
    .await?;

    // Details are best-effort and must not hold up the scheduler.
    let store = state.store.clone();
    let details = state.details.clone();
    let limit = state.config.enrich.batch_limit;
    let concurrency = state.config.enrich.concurrency;
    tokio::spawn(async move {
        match enrich::backfill_details(store.as_ref(), details.as_ref(), limit, concurrency).await
        {
            Ok(summary) => info!(
                pending = summary.pending,
                attached = summary.attached,
                skipped = summary.skipped,
                failed = summary.failed,
                "detail backfill finished"
            ),
            Err(e) => error!(error = %e, "detail backfill aborted"),
        }
    });

    Ok(Json(CronResponse {
        status: "ok",
        captured_at: report.captured_at.to_rfc3339(),
        recorded: report.articles.len(),
        new_articles: report.new_articles,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
