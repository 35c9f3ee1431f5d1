//! REST API serving the operations table
//!
//! Stateless over HTTP: the client keeps its own cursor history and sends
//! back the cursor of the page it wants. `next_cursor` in a response is where
//! the following page starts.

use axum::{
    extract::{Query, Request, State},
    http::{self, header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::FetchConfig;
use crate::error::OpTableError;
use crate::export::{fetch_all, write_csv};
use crate::fetcher::{FetchLimits, FetchResult, OperationFetcher};
use crate::record::{Cursor, OperationType};
use crate::source::{AnySource, OperationQuery};

/// Horizon refuses larger pages.
const MAX_PAGE_LIMIT: u32 = 200;

/// Shared state behind every handler.
pub struct ApiState {
    pub source: AnySource,
    pub fetch: FetchConfig,
    api_stats: RwLock<ApiStats>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl ApiState {
    pub fn new(source: AnySource, fetch: FetchConfig) -> Self {
        Self {
            source,
            fetch,
            api_stats: RwLock::new(ApiStats::new()),
        }
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            uptime_seconds: uptime,
            source: self.source.kind(),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    Upstream(OpTableError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<OpTableError> for ApiError {
    fn from(err: OpTableError) -> Self {
        match err {
            OpTableError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            OpTableError::IoError(msg) => ApiError::InternalError(msg),
            other => ApiError::Upstream(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OperationsQuery {
    pub account: Option<String>,
    pub tx: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    #[serde(rename = "opTypeFilter")]
    pub op_type_filter: Option<String>,
}

#[derive(Serialize)]
pub struct OperationsResponse {
    pub records: Vec<Value>,
    pub count: usize,
    pub filter: Option<String>,
    pub cursor: String,
    pub next_cursor: Option<String>,
    pub possibly_more_data_available: bool,
    pub total_fetched: usize,
    pub pages_fetched: usize,
}

impl OperationsResponse {
    fn new(result: FetchResult, filter: Option<String>) -> Self {
        let next_cursor = if result.is_exhausted() {
            None
        } else {
            Some(result.end_cursor().to_string())
        };
        OperationsResponse {
            count: result.records.len(),
            records: result.records.iter().map(|r| r.to_display_json()).collect(),
            filter,
            cursor: result.started_from.to_string(),
            next_cursor,
            possibly_more_data_available: result.possibly_more_data_available,
            total_fetched: result.total_fetched,
            pages_fetched: result.pages_fetched,
        }
    }
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub uptime_seconds: u64,
    pub source: &'static str,
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Transaction hashes are 64 hex characters.
fn parse_tx_hash(hash_str: &str) -> Result<String, ApiError> {
    if hash_str.len() != 64 {
        return Err(ApiError::InvalidInput(
            "Transaction hash must be a 64-character hex string".to_string(),
        ));
    }
    let mut hash_bytes = [0u8; 32];
    hex::decode_to_slice(hash_str, &mut hash_bytes)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid hex hash: {}", e)))?;
    Ok(hash_str.to_lowercase())
}

fn build_fetcher<'a>(
    state: &'a ApiState,
    params: &OperationsQuery,
) -> Result<OperationFetcher<&'a AnySource>, ApiError> {
    let limit = params.limit.unwrap_or(state.fetch.page_limit);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ApiError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }

    let mut query = OperationQuery::new();
    if let Some(tx) = params.tx.as_deref().filter(|t| !t.is_empty()) {
        query = query.for_transaction(parse_tx_hash(tx)?);
    }
    if let Some(account) = params.account.as_deref().filter(|a| !a.is_empty()) {
        query = query.for_account(account);
    }

    Ok(OperationFetcher::new(&state.source, query, limit)
        .with_filter(params.op_type_filter.clone())
        .with_limits(FetchLimits {
            max_total_records: state.fetch.max_total_records,
        }))
}

// ============================================================================
// Middleware
// ============================================================================

/// Request statistics middleware
async fn stats_middleware(State(state): State<Arc<ApiState>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = state.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        .route("/operations", get(get_operations))
        .route("/operations/types", get(get_operation_types))
        .route("/operations/export.csv", get(export_operations))
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), stats_middleware))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Run the API server on `0.0.0.0:port`
pub async fn run_api_server(
    state: Arc<ApiState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "source": state.source.kind(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_operations(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<OperationsQuery>,
) -> Result<Json<OperationsResponse>, ApiError> {
    let fetcher = build_fetcher(&state, &params)?;
    let from = params
        .cursor
        .as_deref()
        .map(Cursor::new)
        .unwrap_or_default();

    let result = fetcher.fetch_enough(&from).await?;
    Ok(Json(OperationsResponse::new(
        result,
        fetcher.filter().map(str::to_string),
    )))
}

async fn get_operation_types() -> impl IntoResponse {
    let types: Vec<&str> = OperationType::ALL.iter().map(|t| t.as_str()).collect();
    Json(serde_json::json!({ "types": types }))
}

async fn export_operations(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<OperationsQuery>,
) -> Result<Response, ApiError> {
    let fetcher = build_fetcher(&state, &params)?;
    let records = fetch_all(&fetcher, state.fetch.max_export_pages).await?;

    let mut body = Vec::new();
    write_csv(&records, &mut body)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"operations.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

async fn get_api_stats(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.get_stats().await)
}
