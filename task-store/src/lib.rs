//! Contract task index: ingestion + k-NN retrieval.
//!
//! This crate provides a small API to:
//! - Build an index from the task extractor's JSONL output
//! - Retrieve the nearest task fragments for a free-text query
//!
//! Two backends sit behind [`VectorIndex`]: a Qdrant collection and an
//! in-process exact [`FlatIndex`] persisted as JSONL.

mod config;
mod embed;
mod embed_pool;
mod errors;
mod flat_index;
mod ingest;
mod io_jsonl;
mod qdrant_facade;
mod record;
mod vector_index;

pub use config::{DistanceKind, IndexBackend, TaskStoreConfig, VectorSpace};
pub use embed::{EmbeddingsProvider, llm_embedder::LlmEmbedder};
pub use errors::TaskStoreError;
pub use flat_index::FlatIndex;
pub use ingest::IngestReport;
pub use io_jsonl::read_fragments;
pub use qdrant_facade::QdrantIndex;
pub use record::{IngestRow, RetrievalHit, TaskFragment};
pub use vector_index::{IndexFuture, VectorIndex};

use std::{path::Path, sync::Arc};

use tracing::{debug, info, trace};

/// High-level facade wiring configuration, the index and the embedder.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct TaskStore {
    cfg: TaskStoreConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl TaskStore {
    /// Wraps an existing index and embedder.
    pub fn new(
        cfg: TaskStoreConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Self {
        Self {
            cfg,
            index,
            embedder,
        }
    }

    /// Builds the index selected by `cfg.backend`.
    ///
    /// The flat backend loads `cfg.flat_index_path` when it exists and starts
    /// empty otherwise.
    ///
    /// # Errors
    /// Config, I/O or Qdrant client errors.
    pub fn from_config(
        cfg: TaskStoreConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, TaskStoreError> {
        cfg.validate()?;
        let index: Arc<dyn VectorIndex> = match cfg.backend {
            IndexBackend::Qdrant => Arc::new(QdrantIndex::new(&cfg)?),
            IndexBackend::Flat if cfg.flat_index_path.exists() => {
                Arc::new(FlatIndex::load(&cfg.flat_index_path, cfg.distance)?)
            }
            IndexBackend::Flat => {
                info!(path = ?cfg.flat_index_path, "flat index file missing, starting empty");
                Arc::new(FlatIndex::with_path(cfg.distance, &cfg.flat_index_path))
            }
        };
        Ok(Self::new(cfg, index, embedder))
    }

    pub fn config(&self) -> &TaskStoreConfig {
        &self.cfg
    }

    /// Embeds `query` and returns up to `k` nearest fragments, ascending by distance.
    ///
    /// # Errors
    /// Embedding failures or index failures.
    pub async fn similar_tasks(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalHit>, TaskStoreError> {
        trace!(query_len = query.len(), k, "TaskStore::similar_tasks");
        let qv = self.embedder.embed(query).await?;
        let hits = self.index.similarity_search(&qv, k).await?;
        debug!(hits = hits.len(), k, "similar tasks fetched");
        Ok(hits)
    }

    /// Ingests fragments from an explicit JSONL path.
    ///
    /// # Errors
    /// I/O, parse, embedding, vector size or index failures.
    pub async fn ingest_file(
        &self,
        jsonl_path: impl AsRef<Path>,
    ) -> Result<IngestReport, TaskStoreError> {
        ingest::ingest_file(
            &self.cfg,
            jsonl_path,
            self.embedder.as_ref(),
            self.index.as_ref(),
        )
        .await
    }

    /// Ingests `TASKS_JSONL` from configuration.
    ///
    /// # Errors
    /// [`TaskStoreError::Config`] when no default file is configured.
    pub async fn ingest_default(&self) -> Result<IngestReport, TaskStoreError> {
        let path = self
            .cfg
            .tasks_jsonl
            .clone()
            .ok_or_else(|| TaskStoreError::Config("TASKS_JSONL is not set".into()))?;
        self.ingest_file(path).await
    }

    /// Ingests already-parsed fragments.
    pub async fn ingest_fragments(
        &self,
        fragments: Vec<TaskFragment>,
    ) -> Result<IngestReport, TaskStoreError> {
        ingest::ingest_fragments(
            &self.cfg,
            fragments,
            self.embedder.as_ref(),
            self.index.as_ref(),
        )
        .await
    }
}
