use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionModel;
use crate::review::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Pluggable completion backend. Default: `LlmClient` (Chat Completions).
    pub llm: Arc<dyn CompletionModel>,
    pub config: Config,
}

impl AppState {
    pub fn new(llm: Arc<dyn CompletionModel>, config: Config) -> Self {
        Self {
            sessions: SessionStore::with_idle_ttl(chrono::Duration::minutes(
                config.session_idle_minutes,
            )),
            llm,
            config,
        }
    }
}
