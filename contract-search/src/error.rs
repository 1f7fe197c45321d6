//! Typed errors for the search pipeline.

use std::time::Duration;

use ai_llm_service::AiLlmError;
use task_store::TaskStoreError;
use thiserror::Error;

/// Rejected input. Raised before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("top_n must be at least 1")]
    TopNZero,

    #[error("top_n {got} exceeds the maximum of {max}")]
    TopNTooLarge { got: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller supplied an invalid request.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Embedding or index lookup failed.
    #[error("task index error: {0}")]
    Store(#[from] TaskStoreError),

    /// Text generation failed after retries.
    #[error("{stage} generation failed: {source}")]
    Llm {
        stage: &'static str,
        #[source]
        source: AiLlmError,
    },

    /// The generator answered with blank text.
    #[error("{stage} generation returned blank text")]
    EmptyCompletion { stage: &'static str },

    /// A pipeline stage ran past its deadline.
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    /// The in-flight limiter was shut down.
    #[error("search service is shutting down")]
    Unavailable,
}

impl SearchError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SearchError::Validation(_))
    }

    /// Whether the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Validation(_) | SearchError::EmptyCompletion { .. } => false,
            SearchError::Store(e) => e.is_transient(),
            SearchError::Llm { source, .. } => source.is_transient(),
            SearchError::Timeout { .. } | SearchError::Unavailable => true,
        }
    }
}
