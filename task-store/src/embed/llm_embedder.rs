//! Embedding provider backed by the shared [`LlmServiceProfiles`].

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use tracing::warn;

use crate::{EmbeddingsProvider, TaskStoreError};

/// Embeds through the `embedding` profile and enforces an optional dimension.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, TaskStoreError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;

            if let Some(want) = self.dim {
                if v.len() != want {
                    warn!(got = v.len(), want, "embedding dimension mismatch");
                    return Err(TaskStoreError::VectorSizeMismatch { got: v.len(), want });
                }
            }

            Ok(v)
        })
    }
}
