use crate::analysis;
use crate::chart;
use crate::cleaning::{self, CleanCounts, FlaggedContact};
use crate::config::Config;
use crate::errors::{AppError, ResultExt, NO_DATA_MESSAGE};
use crate::export::{self, ExportFormat};
use crate::models::{AnalyzeResponse, Summary, Table};
use crate::summary_store::SummaryStore;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Response header carrying the version of the summary being served.
pub const SUMMARY_VERSION_HEADER: &str = "x-summary-version";

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Most recent analysis result, shared by the analyze and export handlers.
    pub store: SummaryStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: SummaryStore::new(),
        }
    }
}

fn version_header(version: u64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(SUMMARY_VERSION_HEADER),
        HeaderValue::from(version),
    )
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /analyze
///
/// Computes the quality summary of a JSON array of contact rows and stores it
/// as the latest summary. Any processing fault is reported as 400.
pub async fn analyze_contacts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let table = rows_from_payload(payload)?;
    tracing::info!("POST /analyze - {} contact(s)", table.len());

    let summary = analysis::analyze(&table);
    let stored = state.store.publish(summary.clone()).await;

    tracing::info!(
        "Analysis complete: v{} run={} total={} duplicates={} severe={}",
        stored.version,
        stored.run_id,
        summary.total_contacts,
        summary.duplicates,
        summary.severely_incomplete_count
    );

    Ok(Json(AnalyzeResponse::success(summary)))
}

/// GET /full-stats
///
/// Returns the latest stored summary.
pub async fn full_stats(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let stored = state.store.latest().await.ok_or(AppError::NoData)?;
    let summary: Summary = stored.summary.as_ref().clone();

    Ok((
        StatusCode::OK,
        [version_header(stored.version)],
        Json(summary),
    )
        .into_response())
}

/// GET /summary-chart
///
/// Renders the latest summary as a PNG bar chart, or answers 400 in plain text
/// when nothing has been analyzed yet.
pub async fn summary_chart(State(state): State<Arc<AppState>>) -> Response {
    let Some(stored) = state.store.latest().await else {
        tracing::debug!("Chart requested before any analysis");
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            NO_DATA_MESSAGE,
        )
            .into_response();
    };

    let (width, height) = (state.config.chart_width, state.config.chart_height);
    let summary = stored.summary.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        chart::render_summary_chart(&summary, width, height)
    })
    .await
    .context("rendering summary chart")
    .and_then(|png| png.with_context(|| format!("summary v{}", stored.version)));

    match rendered {
        Ok(png) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
                version_header(stored.version),
            ],
            png,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

fn rows_from_payload(payload: Result<Json<Value>, JsonRejection>) -> Result<Table, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(Table::from_json(body)?)
}

/// Body returned by `POST /clean`.
#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub status: &'static str,
    pub cleaned: Vec<FlaggedContact>,
    pub summary: CleanBuckets,
    pub counts: CleanCounts,
}

/// The four flagged buckets of a cleaning pass.
#[derive(Debug, Serialize)]
pub struct CleanBuckets {
    pub duplicates: Vec<FlaggedContact>,
    pub invalid: Vec<FlaggedContact>,
    pub incomplete: Vec<FlaggedContact>,
    pub similar: Vec<FlaggedContact>,
}

/// POST /clean
///
/// Flags duplicate, invalid, incomplete and similar contacts and returns the
/// list without duplicates. The summary store is not touched.
pub async fn clean_contacts(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CleanResponse>, AppError> {
    let table = rows_from_payload(payload)?;
    tracing::info!("POST /clean - {} contact(s)", table.len());

    let report = cleaning::clean_contacts(&table);
    let counts = report.counts();
    tracing::info!(
        "Cleaning complete: kept={} duplicates={} invalid={} incomplete={} similar={}",
        counts.cleaned,
        counts.duplicates,
        counts.invalid,
        counts.incomplete,
        counts.similar
    );

    Ok(Json(CleanResponse {
        status: "success",
        cleaned: report.cleaned,
        summary: CleanBuckets {
            duplicates: report.duplicates,
            invalid: report.invalid,
            incomplete: report.incomplete,
            similar: report.similar,
        },
        counts,
    }))
}

/// POST /import/csv
///
/// Converts a CSV document with a header row into JSON contact rows.
pub async fn import_csv(body: Bytes) -> Result<Json<Table>, AppError> {
    let table = export::table_from_csv(body.as_ref())?;
    tracing::info!("POST /import/csv - {} contact(s)", table.len());
    Ok(Json(table))
}

/// POST /export/{format}
///
/// Converts JSON contact rows to CSV, JSON or vCard as a file download.
pub async fn export_contacts(
    Path(format): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format.parse()?;
    let table = rows_from_payload(payload)?;
    tracing::info!("POST /export/{} - {} contact(s)", format, table.len());

    let document = format
        .render(&table)
        .with_context(|| format!("exporting {} contact(s) as {}", table.len(), format))?;
    let disposition = format!(
        "attachment; filename=\"contacts.{}\"",
        format.extension()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}

/// Routes that read or write the summary store, plus the stateless
/// cleaning and conversion routes.
pub fn analysis_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(analyze_contacts))
        .route("/full-stats", get(full_stats))
        .route("/summary-chart", get(summary_chart))
        .route("/clean", post(clean_contacts))
        .route("/import/csv", post(import_csv))
        .route("/export/:format", post(export_contacts))
}

/// Attaches the health route and the shared middleware stack to `analysis`.
pub fn assemble_router(state: Arc<AppState>, analysis: Router<Arc<AppState>>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .merge(analysis)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Full router without rate limiting.
pub fn build_router(state: Arc<AppState>) -> Router {
    assemble_router(state, analysis_routes())
}
