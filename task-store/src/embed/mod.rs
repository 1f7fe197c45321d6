use std::{future::Future, pin::Pin};

use crate::errors::TaskStoreError;

pub mod llm_embedder;

/// Asynchronous embedding provider.
///
/// Implementations must use the same model/version that produced the indexed
/// vectors, otherwise distances are meaningless.
pub trait EmbeddingsProvider: Send + Sync {
    /// Produces an embedding vector for the given text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, TaskStoreError>> + Send + 'a>>;
}
