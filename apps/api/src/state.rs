use std::sync::Arc;

use crate::llm_client::ChatBackend;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Both providers sit behind the `ChatBackend` trait so handler tests can
/// swap in a scripted backend.
#[derive(Clone)]
pub struct AppState {
    /// Groq — manual analyze flow (pasted job-listing text).
    pub groq: Arc<dyn ChatBackend>,
    /// Perplexity — auto flow (online job-listing research).
    pub perplexity: Arc<dyn ChatBackend>,
}
