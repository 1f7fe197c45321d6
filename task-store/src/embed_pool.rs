//! Embedding executor with concurrency and dimension checks.

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::{embed::EmbeddingsProvider, errors::TaskStoreError, record::TaskFragment};

/// Embeds every fragment, keeping the input order in the output.
///
/// # Arguments
/// - `fragments`: fragments to embed.
/// - `provider`: embedding backend.
/// - `expected_dim`: if `Some`, enforces this vector size (error on mismatch).
/// - `concurrency`: maximum number of in-flight embedding requests.
/// - `progress`: optional bar advanced once per fragment.
///
/// # Errors
/// Returns [`TaskStoreError::VectorSizeMismatch`] if dimensions mismatch, or
/// the first provider error.
pub async fn embed_all(
    fragments: Vec<TaskFragment>,
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<(TaskFragment, Vec<f32>)>, TaskStoreError> {
    info!(total = fragments.len(), concurrency, "embedding fragments");
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<(usize, TaskFragment, Vec<f32>)> =
        stream::iter(fragments.into_iter().enumerate())
            .map(|(i, frag)| async move {
                let v = provider.embed(&frag.text).await?;
                if let Some(p) = progress {
                    p.inc(1);
                }
                Ok::<_, TaskStoreError>((i, frag, v))
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await?;

    results.sort_by_key(|(i, _, _)| *i);

    let Some(want) = expected_dim.or_else(|| results.first().map(|(_, _, v)| v.len())) else {
        return Ok(Vec::new());
    };
    for (_, _, v) in &results {
        if v.len() != want {
            return Err(TaskStoreError::VectorSizeMismatch { got: v.len(), want });
        }
    }

    debug!(dim = want, "embeddings filled");
    Ok(results.into_iter().map(|(_, f, v)| (f, v)).collect())
}
