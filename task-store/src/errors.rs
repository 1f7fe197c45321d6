//! Unified error types for the crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Top-level error for task-store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSONL row.
    #[error("parse error at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization errors outside of line-oriented reading.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] AiLlmError),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl TaskStoreError {
    /// Whether the failure came from a transient embedding-provider condition.
    pub fn is_transient(&self) -> bool {
        matches!(self, TaskStoreError::Embedding(e) if e.is_transient())
    }
}
