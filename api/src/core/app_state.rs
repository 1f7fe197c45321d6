use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contract_search::TaskSearch;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Query pipeline (retrieval + narration).
    pub search: Arc<TaskSearch>,
    /// LLM profiles, probed by `/health`.
    pub llm: Arc<LlmServiceProfiles>,
}

impl AppState {
    pub fn new(search: Arc<TaskSearch>, llm: Arc<LlmServiceProfiles>) -> Self {
        Self { search, llm }
    }
}
