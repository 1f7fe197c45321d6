//! Qdrant-backed [`VectorIndex`].
//!
//! Concentrates all `qdrant-client` usage behind a minimal API. Point ids are
//! UUIDv5 of `contract_id + text`, so re-ingesting the same corpus overwrites
//! instead of duplicating. Qdrant scores are converted to lower-is-better
//! distances before leaving this module.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder, value,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DistanceKind, TaskStoreConfig, VectorSpace};
use crate::errors::TaskStoreError;
use crate::record::{RetrievalHit, TaskFragment};
use crate::vector_index::{IndexFuture, VectorIndex};

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
    exact: bool,
}

impl QdrantIndex {
    /// Creates a new facade from the given configuration.
    ///
    /// # Errors
    /// Returns `Config` on invalid settings and `Qdrant` if the client cannot be built.
    pub fn new(cfg: &TaskStoreConfig) -> Result<Self, TaskStoreError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| TaskStoreError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
            exact: cfg.exact_search,
        })
    }

    async fn ensure_collection(&self, space: &VectorSpace) -> Result<(), TaskStoreError> {
        let exists = self
            .client
            .collection_exists(self.collection.as_str())
            .await
            .map_err(|e| TaskStoreError::Qdrant(e.to_string()))?;
        if exists {
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }

        info!(
            collection = %self.collection,
            size = space.size,
            distance = ?space.distance,
            "creating collection"
        );

        let distance = match space.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(space.size as u64, distance)),
            )
            .await
            .map_err(|e| TaskStoreError::Qdrant(e.to_string()))?;
        Ok(())
    }

    async fn upsert_points(
        &self,
        batch: Vec<(TaskFragment, Vec<f32>)>,
    ) -> Result<usize, TaskStoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let n = batch.len();
        let points: Vec<PointStruct> = batch
            .into_iter()
            .map(|(frag, vector)| {
                let id: PointId = point_id(&frag).to_string().into();
                let mut payload: HashMap<String, QValue> = HashMap::with_capacity(2);
                payload.insert("text".into(), qstring(frag.text));
                payload.insert("contract_id".into(), qstring(frag.contract_id));
                PointStruct::new(id, vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| TaskStoreError::Qdrant(e.to_string()))?;

        debug!(collection = %self.collection, points = n, "upsert acknowledged");
        Ok(n)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalHit>, TaskStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut builder =
            SearchPointsBuilder::new(&self.collection, query.to_vec(), k as u64).with_payload(true);
        if self.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| TaskStoreError::Qdrant(e.to_string()))?;

        let mut out: Vec<RetrievalHit> = res
            .result
            .into_iter()
            .filter_map(|p| hit_from_point(p, self.distance))
            .collect();
        out.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        debug!(collection = %self.collection, hits = out.len(), "search completed");
        Ok(out)
    }
}

impl VectorIndex for QdrantIndex {
    fn similarity_search<'a>(
        &'a self,
        query: &'a [f32],
        k: usize,
    ) -> IndexFuture<'a, Vec<RetrievalHit>> {
        Box::pin(self.search(query, k))
    }

    fn ensure_space<'a>(&'a self, space: &'a VectorSpace) -> IndexFuture<'a, ()> {
        Box::pin(self.ensure_collection(space))
    }

    fn upsert<'a>(&'a self, batch: Vec<(TaskFragment, Vec<f32>)>) -> IndexFuture<'a, usize> {
        Box::pin(self.upsert_points(batch))
    }
}

/// Deterministic point id for a fragment.
pub(crate) fn point_id(frag: &TaskFragment) -> Uuid {
    let key = format!("{}\u{1f}{}", frag.contract_id, frag.text);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
}

/// Converts a native Qdrant score into a lower-is-better distance.
pub(crate) fn score_to_distance(distance: DistanceKind, score: f32) -> f32 {
    match distance {
        DistanceKind::Cosine => 1.0 - score,
        DistanceKind::Dot => -score,
        DistanceKind::Euclid => score,
    }
}

fn hit_from_point(p: ScoredPoint, distance: DistanceKind) -> Option<RetrievalHit> {
    let text = payload_str(&p.payload, "text");
    let contract_id = payload_str(&p.payload, "contract_id");
    match (text, contract_id) {
        (Some(text), Some(contract_id)) => Some(RetrievalHit {
            fragment: TaskFragment { text, contract_id },
            distance: score_to_distance(distance, p.score),
        }),
        _ => {
            warn!(point = ?p.id, "skipping point without text/contract_id payload");
            None
        }
    }
}

fn payload_str(payload: &HashMap<String, QValue>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(value::Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn qstring(s: String) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_stable_and_distinct() {
        let a = TaskFragment::new("Write test plans", "C-1");
        let b = TaskFragment::new("Write test plans", "C-2");
        assert_eq!(point_id(&a), point_id(&a.clone()));
        assert_ne!(point_id(&a), point_id(&b));
    }

    #[test]
    fn scores_become_lower_is_better() {
        assert!(
            score_to_distance(DistanceKind::Cosine, 0.9)
                < score_to_distance(DistanceKind::Cosine, 0.5)
        );
        assert!(score_to_distance(DistanceKind::Dot, 3.0) < score_to_distance(DistanceKind::Dot, 1.0));
        assert_eq!(score_to_distance(DistanceKind::Euclid, 0.25), 0.25);
    }

    #[test]
    fn payload_without_contract_is_skipped() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), qstring("orphan".into()));
        let point = ScoredPoint {
            payload,
            score: 0.8,
            ..Default::default()
        };
        assert!(hit_from_point(point, DistanceKind::Cosine).is_none());
    }
}
