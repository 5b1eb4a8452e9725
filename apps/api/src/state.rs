use std::sync::Arc;

use crate::llm_client::TextGenerator;
use crate::photos::PhotoSearch;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation provider. Production: `LlmClient` (Gemini).
    pub llm: Arc<dyn TextGenerator>,
    /// Image-search provider. Production: `UnsplashClient`.
    pub photos: Arc<dyn PhotoSearch>,
    /// In-memory quiz sessions.
    pub sessions: SessionStore,
}
