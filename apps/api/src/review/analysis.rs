//! Review Analysis — orchestrates one analyze run over a session's reviews.
//!
//! Flow: build_prompt → model.complete → parse_response → satisfaction_score →
//!       summarize_tags → AnalysisReport.
//!
//! Every run covers all accumulated reviews, not only the ones added since the last run.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::CompletionModel;
use crate::review::models::AnalysisReport;
use crate::review::parser::parse_response;
use crate::review::prompts::build_prompt;
use crate::review::scoring::{satisfaction_score, SentimentBreakdown};
use crate::review::session::SessionStore;
use crate::review::tags::summarize_tags;

/// Runs the pipeline for a batch of reviews. Does not touch session state.
pub async fn analyze_reviews(
    reviews: &[String],
    api_key: &str,
    model: &dyn CompletionModel,
) -> Result<AnalysisReport, AppError> {
    if reviews.is_empty() {
        return Err(AppError::EmptyInput);
    }

    let prompt = build_prompt(reviews);
    let raw = model
        .complete(&prompt, api_key)
        .await
        .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    let outcome = parse_response(&raw);
    if outcome.records.is_empty() {
        warn!(
            "Model reply produced no records ({} irrelevant, {} malformed lines)",
            outcome.irrelevant_lines, outcome.malformed_lines
        );
        return Err(AppError::NoValidRecords);
    }

    let breakdown = SentimentBreakdown::from_records(&outcome.records);
    let score = satisfaction_score(&outcome.records)?;
    let tags = summarize_tags(&outcome.records);
    if tags.is_none() {
        info!("No usable tags in {} records", outcome.records.len());
    }

    info!(
        "Analyzed {} reviews: {} records, {} irrelevant, {} malformed, score {score:.2}",
        reviews.len(),
        outcome.records.len(),
        outcome.irrelevant_lines,
        outcome.malformed_lines
    );

    Ok(AnalysisReport::new(
        reviews.len(),
        raw,
        outcome,
        breakdown,
        score,
        tags,
    ))
}

/// Runs the pipeline for a stored session and records the outcome on it.
///
/// The store lock is released while the model call is in flight; the session sits in
/// `Analyzing` meanwhile so a second trigger is refused. If this future is dropped before
/// the outcome is written (client gone, timeout layer), `RunGuard` releases the session.
pub async fn analyze_session(
    store: &SessionStore,
    model: &dyn CompletionModel,
    session_id: Uuid,
) -> Result<AnalysisReport, AppError> {
    let job = store
        .update(session_id, |session| session.begin_analysis())
        .await?;
    let guard = RunGuard::new(store, session_id);

    let result = analyze_reviews(&job.reviews, &job.api_key, model).await;

    // The session may have been ended mid-run; nothing left to record then.
    if let Err(e) = store
        .update(session_id, |session| {
            session.finish_analysis(&result);
            Ok(())
        })
        .await
    {
        warn!("Analysis finished for a session that no longer exists: {e}");
    }
    guard.disarm();

    result
}

/// Moves a session out of `Analyzing` when its run is dropped mid-flight.
struct RunGuard {
    store: SessionStore,
    session_id: Uuid,
    armed: bool,
}

impl RunGuard {
    fn new(store: &SessionStore, session_id: Uuid) -> Self {
        Self {
            store: store.clone(),
            session_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("Analysis for session {} was cancelled", self.session_id);
            self.store.abandon_analysis(self.session_id);
        }
    }
}
