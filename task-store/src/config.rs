//! Runtime and collection configuration.

use std::{path::PathBuf, str::FromStr};

use ai_llm_service::error_handler::opt_env;

use crate::errors::TaskStoreError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = TaskStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "euclidean" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(TaskStoreError::Config(format!("unknown distance '{other}'"))),
        }
    }
}

/// Which [`crate::VectorIndex`] implementation backs the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    /// Remote Qdrant collection.
    Qdrant,
    /// In-process exact index persisted as JSONL.
    Flat,
}

impl FromStr for IndexBackend {
    type Err = TaskStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexBackend::Qdrant),
            "flat" | "memory" => Ok(IndexBackend::Flat),
            other => Err(TaskStoreError::Config(format!(
                "unknown index backend '{other}'"
            ))),
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Debug)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Configuration for task ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct TaskStoreConfig {
    /// Index implementation.
    pub backend: IndexBackend,
    /// Qdrant endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Expected embedding dimension; probed from the provider when `None`.
    pub embedding_dim: Option<usize>,
    /// Parallel embedding requests during ingestion.
    pub embedding_concurrency: usize,
    /// On-disk location of the flat index.
    pub flat_index_path: PathBuf,
    /// Default JSONL produced by the task extractor.
    pub tasks_jsonl: Option<PathBuf>,
}

impl TaskStoreConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 256,
            exact_search: false,
            embedding_dim: None,
            embedding_concurrency: 4,
            flat_index_path: PathBuf::from("data/task_index.jsonl"),
            tasks_jsonl: None,
        }
    }

    /// Reads the configuration from environment variables.
    ///
    /// `INDEX_BACKEND`, `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION`,
    /// `QDRANT_BATCH_SIZE`, `RAG_EXACT_SEARCH`, `DISTANCE`, `EMBEDDING_DIM`,
    /// `EMBEDDING_CONCURRENCY`, `FLAT_INDEX_PATH`, `TASKS_JSONL`.
    ///
    /// # Errors
    /// Returns [`TaskStoreError::Config`] on unparsable values.
    pub fn from_env() -> Result<Self, TaskStoreError> {
        let mut cfg = Self::new_default(
            opt_env("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".into()),
            opt_env("QDRANT_COLLECTION").unwrap_or_else(|| "contract_tasks".into()),
        );

        if let Some(b) = opt_env("INDEX_BACKEND") {
            cfg.backend = b.parse()?;
        }
        cfg.qdrant_api_key = opt_env("QDRANT_API_KEY");
        if let Some(d) = opt_env("DISTANCE") {
            cfg.distance = d.parse()?;
        }
        if let Some(n) = env_parse::<usize>("QDRANT_BATCH_SIZE")? {
            cfg.upsert_batch = n;
        }
        if let Some(flag) = env_parse::<bool>("RAG_EXACT_SEARCH")? {
            cfg.exact_search = flag;
        }
        cfg.embedding_dim = env_parse::<usize>("EMBEDDING_DIM")?;
        if let Some(n) = env_parse::<usize>("EMBEDDING_CONCURRENCY")? {
            cfg.embedding_concurrency = n;
        }
        if let Some(p) = opt_env("FLAT_INDEX_PATH") {
            cfg.flat_index_path = PathBuf::from(p);
        }
        cfg.tasks_jsonl = opt_env("TASKS_JSONL").map(PathBuf::from);

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), TaskStoreError> {
        if self.backend == IndexBackend::Qdrant {
            if self.qdrant_url.trim().is_empty() {
                return Err(TaskStoreError::Config("qdrant_url is empty".into()));
            }
            if self.collection.trim().is_empty() {
                return Err(TaskStoreError::Config("collection is empty".into()));
            }
        }
        if self.upsert_batch == 0 {
            return Err(TaskStoreError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(TaskStoreError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, TaskStoreError> {
    opt_env(var)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| TaskStoreError::Config(format!("{var}: cannot parse '{raw}'")))
        })
        .transpose()
}
