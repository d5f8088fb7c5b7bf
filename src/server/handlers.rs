//! HTTP handlers for the analysis API.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::AppState;
use crate::rate_limit::Decision;
use crate::services::SubmitError;

/// Request body for the analyze endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// User-visible failure, mapped 1:1 to a status/message pair.
///
/// Diagnostic detail is logged where the error is mapped; callers only
/// ever see these fixed messages.
#[derive(Debug)]
pub enum ApiError {
    InvalidJson,
    InvalidInput(String),
    RateLimited,
    Classification,
    Storage,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::InvalidJson => (
                StatusCode::BAD_REQUEST,
                "Invalid JSON body".to_string(),
            ),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again in a minute.".to_string(),
            ),
            ApiError::Classification => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI analysis failed.".to_string(),
            ),
            ApiError::Storage => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not save analysis report.".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::EmptyInput | SubmitError::TooLong(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            SubmitError::Classification(e) => {
                error!("Classification failed: {}", e);
                ApiError::Classification
            }
            SubmitError::Storage(e) => {
                error!("Storage error: {}", e);
                ApiError::Storage
            }
        }
    }
}

/// Resolve the caller address from proxy headers.
///
/// First hop of x-forwarded-for, then x-real-ip, then a fixed fallback.
pub fn client_addr(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.trim().is_empty() {
            return real_ip.trim().to_string();
        }
    }
    "127.0.0.1".to_string()
}

/// Submit feedback text for analysis.
///
/// Admission control runs before anything else: a rate-limited caller gets
/// a 429 without body parsing, store access, or an external call.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let caller = client_addr(&headers);
    if state.limiter.check(&caller).await == Decision::Limited {
        warn!("Rate limited caller {}", caller);
        return ApiError::RateLimited.into_response();
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(_) => return ApiError::InvalidJson.into_response(),
    };
    let text = request.text.unwrap_or_default();

    match state.service.submit(&text).await {
        Ok(outcome) => Json(json!({ "jobId": outcome.report_id })).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Fetch a stored report by id.
pub async fn report_detail(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Response {
    match state.reports.get(&report_id).await {
        Ok(Some(report)) => Json(json!({
            "id": report.id,
            "createdAt": report.created_at.to_rfc3339(),
            "report": report.payload,
            "sourceText": report.source_text,
        }))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Report not found" })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to load report {}: {}", report_id, e);
            ApiError::Storage.into_response()
        }
    }
}

/// Overall service status.
pub async fn api_status(State(state): State<AppState>) -> Response {
    match state.reports.count().await {
        Ok(count) => Json(json!({ "reports": { "total": count } })).into_response(),
        Err(e) => {
            error!("Failed to count reports: {}", e);
            ApiError::Storage.into_response()
        }
    }
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
