//! In-process exact k-NN index persisted as JSONL.
//!
//! Scans every vector on each lookup. Ties keep insertion order, which makes
//! results fully deterministic for a given file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{DistanceKind, VectorSpace};
use crate::errors::TaskStoreError;
use crate::io_jsonl::{read_stored, write_stored};
use crate::record::{RetrievalHit, StoredVector, TaskFragment};
use crate::vector_index::{IndexFuture, VectorIndex};

#[derive(Default)]
struct Inner {
    dim: Option<usize>,
    rows: Vec<StoredVector>,
    /// `(contract_id, text)` → position in `rows`.
    positions: HashMap<(String, String), usize>,
}

impl Inner {
    fn insert(&mut self, frag: TaskFragment, embedding: Vec<f32>) -> Result<(), TaskStoreError> {
        match self.dim {
            Some(want) if want != embedding.len() => {
                return Err(TaskStoreError::VectorSizeMismatch {
                    got: embedding.len(),
                    want,
                });
            }
            None => self.dim = Some(embedding.len()),
            _ => {}
        }

        let key = (frag.contract_id.clone(), frag.text.clone());
        let row = StoredVector {
            text: frag.text,
            contract_id: frag.contract_id,
            embedding,
        };
        match self.positions.get(&key) {
            Some(&pos) => self.rows[pos] = row,
            None => {
                self.positions.insert(key, self.rows.len());
                self.rows.push(row);
            }
        }
        Ok(())
    }
}

/// Exact in-memory index.
pub struct FlatIndex {
    distance: DistanceKind,
    path: Option<PathBuf>,
    inner: RwLock<Inner>,
}

impl FlatIndex {
    /// Empty index; `persist` is a no-op until a path is attached.
    pub fn new(distance: DistanceKind) -> Self {
        Self {
            distance,
            path: None,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Empty index that writes itself to `path` on `persist`.
    pub fn with_path(distance: DistanceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(distance)
        }
    }

    /// Loads a previously saved index. The path is kept for later `persist` calls.
    ///
    /// # Errors
    /// I/O and parse errors, or [`TaskStoreError::VectorSizeMismatch`] on mixed dimensions.
    pub fn load(path: impl AsRef<Path>, distance: DistanceKind) -> Result<Self, TaskStoreError> {
        let path = path.as_ref();
        let mut inner = Inner::default();
        for row in read_stored(path)? {
            inner.insert(TaskFragment::new(row.text, row.contract_id), row.embedding)?;
        }
        info!(path = ?path, records = inner.rows.len(), "flat index loaded");

        Ok(Self {
            distance,
            path: Some(path.to_path_buf()),
            inner: RwLock::new(inner),
        })
    }

    /// Builds an index from `records` and writes it to `path`.
    ///
    /// # Errors
    /// [`TaskStoreError::VectorSizeMismatch`] on mixed dimensions, or I/O errors.
    pub async fn build_and_save(
        records: Vec<(TaskFragment, Vec<f32>)>,
        path: impl AsRef<Path>,
        distance: DistanceKind,
    ) -> Result<Self, TaskStoreError> {
        let index = Self::with_path(distance, path.as_ref());
        index.insert_all(records).await?;
        index.save(path).await?;
        Ok(index)
    }

    /// Writes all records to `path` as JSONL.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), TaskStoreError> {
        let inner = self.inner.read().await;
        write_stored(path.as_ref(), &inner.rows)?;
        info!(path = ?path.as_ref(), records = inner.rows.len(), "flat index saved");
        Ok(())
    }

    /// Number of stored fragments.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn insert_all(&self, batch: Vec<(TaskFragment, Vec<f32>)>) -> Result<usize, TaskStoreError> {
        let n = batch.len();
        let mut inner = self.inner.write().await;
        // All or nothing: a bad row must not leave earlier rows behind.
        if let Some(want) = inner.dim.or_else(|| batch.first().map(|(_, v)| v.len())) {
            if let Some((_, v)) = batch.iter().find(|(_, v)| v.len() != want) {
                return Err(TaskStoreError::VectorSizeMismatch {
                    got: v.len(),
                    want,
                });
            }
        }
        for (frag, v) in batch {
            inner.insert(frag, v)?;
        }
        Ok(n)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalHit>, TaskStoreError> {
        let inner = self.inner.read().await;
        if k == 0 || inner.rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(want) = inner.dim {
            if query.len() != want {
                return Err(TaskStoreError::VectorSizeMismatch {
                    got: query.len(),
                    want,
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = inner
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, distance(self.distance, query, &row.embedding)))
            .collect();
        // Stable sort keeps insertion order on equal distances.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        let hits: Vec<RetrievalHit> = scored
            .into_iter()
            .map(|(i, d)| {
                let row = &inner.rows[i];
                RetrievalHit {
                    fragment: TaskFragment::new(row.text.as_str(), row.contract_id.as_str()),
                    distance: d,
                }
            })
            .collect();

        debug!(hits = hits.len(), k, "flat search completed");
        Ok(hits)
    }
}

impl VectorIndex for FlatIndex {
    fn similarity_search<'a>(
        &'a self,
        query: &'a [f32],
        k: usize,
    ) -> IndexFuture<'a, Vec<RetrievalHit>> {
        Box::pin(self.search(query, k))
    }

    fn ensure_space<'a>(&'a self, space: &'a VectorSpace) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            match inner.dim {
                Some(want) if want != space.size => Err(TaskStoreError::VectorSizeMismatch {
                    got: space.size,
                    want,
                }),
                _ => {
                    inner.dim = Some(space.size);
                    Ok(())
                }
            }
        })
    }

    fn upsert<'a>(&'a self, batch: Vec<(TaskFragment, Vec<f32>)>) -> IndexFuture<'a, usize> {
        Box::pin(self.insert_all(batch))
    }

    fn persist<'a>(&'a self) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            match &self.path {
                Some(path) => self.save(path).await,
                None => Ok(()),
            }
        })
    }
}

/// Lower-is-better distance between two equal-length vectors.
fn distance(kind: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match kind {
        DistanceKind::Dot => -dot,
        DistanceKind::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        DistanceKind::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                1.0
            } else {
                1.0 - dot / (na * nb)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, cid: &str) -> TaskFragment {
        TaskFragment::new(text, cid)
    }

    #[tokio::test]
    async fn nearest_first_with_insertion_order_ties() {
        let idx = FlatIndex::new(DistanceKind::Euclid);
        idx.upsert(vec![
            (frag("far", "C-1"), vec![5.0, 0.0]),
            (frag("tie-a", "C-2"), vec![1.0, 0.0]),
            (frag("tie-b", "C-3"), vec![-1.0, 0.0]),
        ])
        .await
        .unwrap();

        let hits = idx.similarity_search(&[0.0, 0.0], 2).await.unwrap();
        let texts: Vec<_> = hits.iter().map(|h| h.fragment.text.as_str()).collect();
        assert_eq!(texts, vec!["tie-a", "tie-b"]);
        assert_eq!(hits[0].distance, 1.0);
    }

    #[tokio::test]
    async fn reupsert_replaces_instead_of_duplicating() {
        let idx = FlatIndex::new(DistanceKind::Cosine);
        idx.upsert(vec![(frag("a", "C"), vec![1.0, 0.0])]).await.unwrap();
        idx.upsert(vec![(frag("a", "C"), vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(idx.len().await, 1);

        let hits = idx.similarity_search(&[0.0, 1.0], 5).await.unwrap();
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn mixed_dimensions_are_rejected() {
        let idx = FlatIndex::new(DistanceKind::Cosine);
        idx.upsert(vec![(frag("a", "C"), vec![1.0, 0.0])]).await.unwrap();
        let err = idx.upsert(vec![(frag("b", "C"), vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, TaskStoreError::VectorSizeMismatch { got: 1, want: 2 }));
        assert!(idx.similarity_search(&[1.0, 0.0, 0.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn failed_batch_leaves_index_untouched() {
        let idx = FlatIndex::new(DistanceKind::Cosine);
        idx.upsert(vec![(frag("a", "C"), vec![1.0, 0.0])]).await.unwrap();

        let err = idx
            .upsert(vec![
                (frag("b", "C"), vec![0.0, 1.0]),
                (frag("c", "C"), vec![1.0]),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, TaskStoreError::VectorSizeMismatch { got: 1, want: 2 }));
        assert_eq!(idx.len().await, 1);
    }

    #[tokio::test]
    async fn first_batch_with_mixed_dimensions_sets_nothing() {
        let idx = FlatIndex::new(DistanceKind::Cosine);
        let err = idx
            .upsert(vec![(frag("a", "C"), vec![1.0, 0.0]), (frag("b", "C"), vec![1.0])])
            .await
            .unwrap_err();

        assert!(matches!(err, TaskStoreError::VectorSizeMismatch { got: 1, want: 2 }));
        assert!(idx.is_empty().await);
        // Dimension is still open, so a 3-d batch is accepted.
        idx.upsert(vec![(frag("c", "C"), vec![1.0, 0.0, 0.0])]).await.unwrap();
        assert_eq!(idx.len().await, 1);
    }

    #[tokio::test]
    async fn build_save_load_keeps_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.jsonl");
        let records = vec![
            (frag("Develop a test plan", "C-1"), vec![1.0, 0.0, 0.0]),
            (frag("Maintain servers", "C-2"), vec![0.0, 1.0, 0.0]),
        ];

        let built = FlatIndex::build_and_save(records, &path, DistanceKind::Cosine)
            .await
            .unwrap();
        let loaded = FlatIndex::load(&path, DistanceKind::Cosine).unwrap();

        let q = [0.9, 0.1, 0.0];
        let a = built.similarity_search(&q, 2).await.unwrap();
        let b = loaded.similarity_search(&q, 2).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(b[0].fragment.contract_id, "C-1");
    }

    #[test]
    fn zero_vector_has_max_cosine_distance() {
        assert_eq!(distance(DistanceKind::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
