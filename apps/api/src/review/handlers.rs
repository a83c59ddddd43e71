//! Axum route handlers for the Review API.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::review::analysis::analyze_session;
use crate::review::export::{records_to_csv, EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME};
use crate::review::models::AnalysisReport;
use crate::review::session::{SessionStatus, SubmitOutcome};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    /// False when the text was empty and nothing was stored.
    pub accepted: bool,
    pub submission_count: u32,
    pub remaining: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts an empty session. Without an `api_key` in the body the configured default
/// credential is used; with neither, the session starts not ready.
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let api_key = request
        .api_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| state.config.default_api_key.clone());
    let ready = api_key.is_some();

    let session_id = state.sessions.create(api_key).await;
    info!("Session {session_id} created (ready: {ready})");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id, ready }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(state.sessions.status(id).await?))
}

/// DELETE /api/v1/sessions/:id
///
/// Ends the session. Reviews and results are gone for good.
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.end(id).await?;
    info!("Session {id} ended");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/credential
///
/// Supplies a (new) model credential and marks the session ready again.
pub async fn handle_set_credential(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CredentialRequest>,
) -> Result<Json<SessionStatus>, AppError> {
    let api_key = request.api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(AppError::Validation("api_key cannot be empty".to_string()));
    }

    let status = state
        .sessions
        .update(id, |session| {
            session.set_credential(api_key);
            Ok(SessionStatus::of(id, session))
        })
        .await?;

    Ok(Json(status))
}

/// POST /api/v1/sessions/:id/reviews
///
/// Adds one review. Empty text is a no-op; the eleventh review is rejected.
pub async fn handle_submit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let outcome = session.submit(&request.text)?;
            Ok(SubmitReviewResponse {
                accepted: outcome == SubmitOutcome::Accepted,
                submission_count: session.submission_count(),
                remaining: session.remaining(),
            })
        })
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/analyze
///
/// Runs the full pipeline over every review the session holds.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisReport>, AppError> {
    let report = analyze_session(&state.sessions, state.llm.as_ref(), id).await?;
    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/analysis
///
/// Returns the latest successful report.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisReport>, AppError> {
    let report = state
        .sessions
        .read(id, |session| {
            session
                .last_report()
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Session {id} has no analysis yet")))
        })
        .await?;

    Ok(Json(report))
}

/// GET /api/v1/sessions/:id/analysis/export.csv
///
/// Downloads the latest analysis table as `review_analysis.csv`.
pub async fn handle_export_csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let records = state
        .sessions
        .read(id, |session| {
            session
                .last_report()
                .map(|r| r.records.clone())
                .ok_or_else(|| AppError::NotFound(format!("Session {id} has no analysis yet")))
        })
        .await?;

    let csv = records_to_csv(&records)?;

    Ok((
        [
            (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    ))
}
