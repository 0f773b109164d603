//! API request handlers
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or [`ApiErrorResponse`].

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::AnalysisConfig;
use crate::pipeline::{IngestionStats, WindowBuffer};
use crate::processing::{analyze_window, AnalysisReport};
use crate::types::{Axis, IncompleteReason, Window, WindowStatus};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub buffer: Arc<WindowBuffer>,
    pub ingestion: Arc<IngestionStats>,
    pub analysis: AnalysisConfig,
    /// Samples returned or analyzed when `count` is not given
    pub default_count: usize,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        buffer: Arc<WindowBuffer>,
        ingestion: Arc<IngestionStats>,
        analysis: AnalysisConfig,
        default_count: usize,
    ) -> Self {
        Self {
            buffer,
            ingestion,
            analysis,
            default_count,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub capacity: usize,
    pub buffered: usize,
    pub appended: u64,
    pub evicted: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub active_connections: u64,
    pub total_connections: u64,
    pub feed_subscribers: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct WindowResponse {
    pub count: usize,
    pub samples: Window,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: usize,
}

// ============================================================================
// Query parsing
// ============================================================================

type Params = HashMap<String, String>;

fn parse_count(params: &Params, default: usize) -> Result<usize, Response> {
    match params.get("count") {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => Err(ApiErrorResponse::bad_request("count must be at least 1")),
            Ok(n) => Ok(n),
            Err(_) => Err(ApiErrorResponse::bad_request(format!(
                "count must be a positive integer, got '{raw}'"
            ))),
        },
    }
}

fn parse_axis(params: &Params, default: Axis) -> Result<Axis, Response> {
    match params.get("axis") {
        None => Ok(default),
        Some(raw) => raw.parse::<Axis>().map_err(ApiErrorResponse::bad_request),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn get_health() -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<ApiState>) -> Response {
    let buffer = state.buffer.stats();
    let ingestion = state.ingestion.snapshot();

    ApiResponse::ok(StatusResponse {
        capacity: buffer.capacity,
        buffered: buffer.len,
        appended: buffer.appended,
        evicted: buffer.evicted,
        accepted: ingestion.accepted,
        rejected: ingestion.rejected,
        active_connections: ingestion.active_connections,
        total_connections: ingestion.total_connections,
        feed_subscribers: buffer.subscribers,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// GET /api/v1/window?count=N
pub async fn get_window(State(state): State<ApiState>, Query(params): Query<Params>) -> Response {
    let count = match parse_count(&params, state.default_count) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let window = state.buffer.snapshot(count);
    ApiResponse::ok(WindowResponse {
        count: window.len(),
        samples: window,
    })
}

/// DELETE /api/v1/window
pub async fn clear_window(State(state): State<ApiState>) -> Response {
    let cleared = state.buffer.len();
    state.buffer.clear();
    tracing::info!(cleared, "[API] Buffer cleared");
    ApiResponse::ok(ClearedResponse { cleared })
}

/// GET /api/v1/analysis?axis=x&count=N
///
/// A buffer holding fewer than `count` samples is analyzed as it is and the
/// report is marked incomplete.
pub async fn get_analysis(State(state): State<ApiState>, Query(params): Query<Params>) -> Response {
    let count = match parse_count(&params, state.default_count) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let axis = match parse_axis(&params, state.analysis.axis) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let window = state.buffer.snapshot(count);
    if window.is_empty() {
        return ApiErrorResponse::service_unavailable("No samples buffered yet");
    }

    let status = if window.len() >= count {
        WindowStatus::Complete
    } else {
        WindowStatus::Incomplete {
            reason: IncompleteReason::InsufficientData,
        }
    };

    let settings = state.analysis.settings();
    let result = tokio::task::spawn_blocking(move || -> AnalysisReport {
        analyze_window(&window, axis, status, &settings)
    })
    .await;

    match result {
        Ok(report) => ApiResponse::ok(report),
        Err(e) => {
            tracing::error!(error = %e, "[API] Analysis task failed");
            ApiErrorResponse::internal("Analysis task failed")
        }
    }
}
