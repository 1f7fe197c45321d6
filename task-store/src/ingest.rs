//! Index building: read extractor JSONL → dedupe → embed → upsert in batches.

use std::collections::HashSet;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{TaskStoreConfig, VectorSpace};
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::TaskStoreError;
use crate::io_jsonl::read_fragments;
use crate::record::TaskFragment;
use crate::vector_index::VectorIndex;

/// Outcome of one ingestion run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Non-empty fragments read from the file.
    pub read: usize,
    /// Fragments left after collapsing exact `(contract_id, text)` duplicates.
    pub unique: usize,
    /// Records acknowledged by the index.
    pub indexed: usize,
}

/// Ingests fragments from an explicit JSONL path.
pub async fn ingest_file(
    cfg: &TaskStoreConfig,
    jsonl_path: impl AsRef<Path>,
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<IngestReport, TaskStoreError> {
    info!(path = ?jsonl_path.as_ref(), "ingesting task file");
    let fragments = read_fragments(jsonl_path)?;
    ingest_fragments(cfg, fragments, provider, index).await
}

/// Ingests already-parsed fragments.
///
/// # Errors
/// Embedding failures, dimension mismatches, or index failures.
pub async fn ingest_fragments(
    cfg: &TaskStoreConfig,
    fragments: Vec<TaskFragment>,
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<IngestReport, TaskStoreError> {
    let read = fragments.len();
    let fragments = dedup_preserving_order(fragments);
    let unique = fragments.len();

    if fragments.is_empty() {
        warn!("no task fragments to ingest");
        return Ok(IngestReport::default());
    }

    let pb = ProgressBar::new(unique as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }

    let embedded = embed_all(
        fragments,
        provider,
        cfg.embedding_dim,
        cfg.embedding_concurrency,
        Some(&pb),
    )
    .await?;
    pb.finish_and_clear();

    let Some(size) = embedded.first().map(|(_, v)| v.len()) else {
        return Ok(IngestReport { read, unique, indexed: 0 });
    };
    index
        .ensure_space(&VectorSpace {
            size,
            distance: cfg.distance,
        })
        .await?;

    let mut indexed = 0;
    let mut rest = embedded;
    let batch_size = cfg.upsert_batch.max(1);
    while !rest.is_empty() {
        let tail = rest.split_off(batch_size.min(rest.len()));
        indexed += index.upsert(rest).await?;
        rest = tail;
    }
    index.persist().await?;

    info!(read, unique, indexed, dim = size, "ingestion complete");
    Ok(IngestReport {
        read,
        unique,
        indexed,
    })
}

/// Collapses exact `(contract_id, text)` duplicates, keeping the first sighting.
fn dedup_preserving_order(fragments: Vec<TaskFragment>) -> Vec<TaskFragment> {
    let mut seen: HashSet<TaskFragment> = HashSet::with_capacity(fragments.len());
    fragments
        .into_iter()
        .filter(|f| seen.insert(f.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistanceKind, IndexBackend};
    use crate::flat_index::FlatIndex;
    use std::{future::Future, pin::Pin};

    struct CharEmbedder;

    impl EmbeddingsProvider for CharEmbedder {
        fn embed<'a>(
            &'a self,
            text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, TaskStoreError>> + Send + 'a>> {
            Box::pin(async move { Ok(vec![text.len() as f32, 1.0]) })
        }
    }

    fn cfg(batch: usize) -> TaskStoreConfig {
        let mut cfg = TaskStoreConfig::new_default("", "");
        cfg.backend = IndexBackend::Flat;
        cfg.distance = DistanceKind::Euclid;
        cfg.upsert_batch = batch;
        cfg
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let out = dedup_preserving_order(vec![
            TaskFragment::new("b", "C"),
            TaskFragment::new("a", "C"),
            TaskFragment::new("b", "C"),
            TaskFragment::new("b", "D"),
        ]);
        assert_eq!(
            out,
            vec![
                TaskFragment::new("b", "C"),
                TaskFragment::new("a", "C"),
                TaskFragment::new("b", "D"),
            ]
        );
    }

    #[tokio::test]
    async fn batches_reach_the_index() {
        let index = FlatIndex::new(DistanceKind::Euclid);
        let frags = (0..7)
            .map(|i| TaskFragment::new("x".repeat(i + 1), format!("C-{}", i % 3)))
            .chain(std::iter::once(TaskFragment::new("x", "C-0")))
            .collect();

        let report = ingest_fragments(&cfg(3), frags, &CharEmbedder, &index)
            .await
            .unwrap();
        assert_eq!(
            report,
            IngestReport {
                read: 8,
                unique: 7,
                indexed: 7
            }
        );
        assert_eq!(index.len().await, 7);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let index = FlatIndex::new(DistanceKind::Euclid);
        let report = ingest_fragments(&cfg(3), Vec::new(), &CharEmbedder, &index)
            .await
            .unwrap();
        assert_eq!(report, IngestReport::default());
    }
}
