//! Session store — per-session review accumulation, submission cap, credential and analysis state.
//!
//! Sessions are in-memory only and die with the process. The store is an explicit object
//! carried in `AppState`, so tests can run any number of isolated stores side by side.
//!
//! A session nobody has touched for longer than the idle TTL counts as ended: lookups treat
//! it as missing, and every `create` sweeps such sessions out of the map.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::review::models::{AnalysisPhase, AnalysisReport, SubmissionPhase};

/// Maximum number of reviews a single session may submit.
pub const SUBMISSION_CAP: u32 = 10;
/// Idle time after which an untouched session is dropped.
pub const DEFAULT_IDLE_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Empty text; nothing was stored.
    Ignored,
}

/// Inputs for one analyze run, copied out so the store lock is not held across the model call.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub reviews: Vec<String>,
    pub api_key: String,
}

#[derive(Debug)]
pub struct Session {
    reviews: Vec<String>,
    submission_count: u32,
    api_key: Option<String>,
    ready: bool,
    analysis_phase: AnalysisPhase,
    last_report: Option<AnalysisReport>,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(api_key: Option<String>) -> Self {
        let ready = api_key.is_some();
        let now = Utc::now();
        Self {
            reviews: Vec::new(),
            submission_count: 0,
            api_key,
            ready,
            analysis_phase: AnalysisPhase::NoAnalysis,
            last_report: None,
            created_at: now,
            last_seen: now,
        }
    }

    /// Appends a review verbatim. Empty text is a no-op, checked before the cap.
    pub fn submit(&mut self, text: &str) -> Result<SubmitOutcome, AppError> {
        if text.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.submission_count >= SUBMISSION_CAP {
            return Err(AppError::SubmissionRejected);
        }
        self.reviews.push(text.to_string());
        self.submission_count += 1;
        Ok(SubmitOutcome::Accepted)
    }

    pub fn reviews(&self) -> &[String] {
        &self.reviews
    }

    pub fn submission_count(&self) -> u32 {
        self.submission_count
    }

    pub fn remaining(&self) -> u32 {
        SUBMISSION_CAP.saturating_sub(self.submission_count)
    }

    pub fn submission_phase(&self) -> SubmissionPhase {
        match self.submission_count {
            0 => SubmissionPhase::Idle,
            n if n < SUBMISSION_CAP => SubmissionPhase::Collecting,
            _ => SubmissionPhase::Limited,
        }
    }

    pub fn analysis_phase(&self) -> AnalysisPhase {
        self.analysis_phase
    }

    pub fn is_ready(&self) -> bool {
        self.ready && self.api_key.is_some()
    }

    pub fn last_report(&self) -> Option<&AnalysisReport> {
        self.last_report.as_ref()
    }

    pub fn set_credential(&mut self, api_key: String) {
        self.api_key = Some(api_key);
        self.ready = true;
    }

    /// Moves the session into `Analyzing` and hands out a snapshot of everything the run needs.
    pub fn begin_analysis(&mut self) -> Result<AnalysisJob, AppError> {
        if self.analysis_phase == AnalysisPhase::Analyzing {
            return Err(AppError::Conflict(
                "An analysis is already running for this session".to_string(),
            ));
        }
        if self.reviews.is_empty() {
            return Err(AppError::EmptyInput);
        }
        let api_key = match (&self.api_key, self.ready) {
            (Some(key), true) => key.clone(),
            _ => return Err(AppError::SessionNotReady),
        };

        self.analysis_phase = AnalysisPhase::Analyzing;
        Ok(AnalysisJob {
            reviews: self.reviews.clone(),
            api_key,
        })
    }

    /// Releases an `Analyzing` session whose run was dropped before it reported back.
    pub fn abandon_analysis(&mut self) {
        if self.analysis_phase == AnalysisPhase::Analyzing {
            self.analysis_phase = AnalysisPhase::Failed;
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, idle_ttl: Duration) -> bool {
        now - self.last_seen > idle_ttl
    }

    /// Records the outcome of a run. A failed run keeps the previous report.
    pub fn finish_analysis(&mut self, result: &Result<AnalysisReport, AppError>) {
        match result {
            Ok(report) => {
                self.analysis_phase = AnalysisPhase::Analyzed;
                self.last_report = Some(report.clone());
            }
            Err(AppError::ModelUnavailable(_)) => {
                // A failed model call invalidates the credential until the user supplies a new one.
                self.api_key = None;
                self.ready = false;
                self.analysis_phase = AnalysisPhase::Failed;
            }
            Err(_) => self.analysis_phase = AnalysisPhase::Failed,
        }
    }
}

/// Public view of a session. Never includes the credential.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub reviews: Vec<String>,
    pub submission_count: u32,
    pub remaining: u32,
    pub submission_phase: SubmissionPhase,
    pub analysis_phase: AnalysisPhase,
    pub ready: bool,
    pub created_at: DateTime<Utc>,
}

impl SessionStatus {
    pub fn of(session_id: Uuid, session: &Session) -> Self {
        Self {
            session_id,
            reviews: session.reviews().to_vec(),
            submission_count: session.submission_count,
            remaining: session.remaining(),
            submission_phase: session.submission_phase(),
            analysis_phase: session.analysis_phase(),
            ready: session.is_ready(),
            created_at: session.created_at,
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::minutes(DEFAULT_IDLE_TTL_MINUTES))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn create(&self, api_key: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, self.idle_ttl));
        if sessions.len() < before {
            debug!("Evicted {} idle sessions", before - sessions.len());
        }
        sessions.insert(id, Session::new(api_key));
        id
    }

    /// Runs `f` against a live session, refreshing its idle timer.
    pub async fn read<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        self.update(id, |session| f(session)).await
    }

    /// Runs `f` against a live session under the write lock, refreshing its idle timer.
    /// An expired session is removed and reported as missing.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let expired = sessions
            .get(&id)
            .map(|s| s.is_expired(now, self.idle_ttl))
            .ok_or_else(|| not_found(id))?;
        if expired {
            sessions.remove(&id);
            info!("Session {id} expired after idling");
            return Err(not_found(id));
        }
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        session.last_seen = now;
        f(session)
    }

    pub async fn status(&self, id: Uuid) -> Result<SessionStatus, AppError> {
        self.read(id, |s| Ok(SessionStatus::of(id, s))).await
    }

    /// Destroys a session and everything it accumulated.
    pub async fn end(&self, id: Uuid) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Synchronous release of a dropped analysis run, for use from `Drop`.
    /// Falls back to a spawned task when the store lock is busy.
    pub fn abandon_analysis(&self, id: Uuid) {
        if let Ok(mut sessions) = self.sessions.try_write() {
            if let Some(session) = sessions.get_mut(&id) {
                session.abandon_analysis();
            }
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let sessions = Arc::clone(&self.sessions);
                handle.spawn(async move {
                    if let Some(session) = sessions.write().await.get_mut(&id) {
                        session.abandon_analysis();
                    }
                });
            }
            Err(_) => warn!("Could not release analysis for session {id}: no runtime"),
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
