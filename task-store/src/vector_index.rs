//! Storage-agnostic k-NN interface.

use std::{future::Future, pin::Pin};

use crate::config::VectorSpace;
use crate::errors::TaskStoreError;
use crate::record::{RetrievalHit, TaskFragment};

/// Boxed future returned by [`VectorIndex`] methods.
pub type IndexFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TaskStoreError>> + Send + 'a>>;

/// Vector index holding `(vector, text, contract_id)` records.
///
/// Implementations must support concurrent lookups through `&self`.
pub trait VectorIndex: Send + Sync {
    /// Returns up to `k` nearest fragments ordered by ascending distance.
    fn similarity_search<'a>(&'a self, query: &'a [f32], k: usize)
    -> IndexFuture<'a, Vec<RetrievalHit>>;

    /// Makes sure the underlying storage accepts vectors of `space`.
    fn ensure_space<'a>(&'a self, space: &'a VectorSpace) -> IndexFuture<'a, ()>;

    /// Inserts or replaces records. Returns the number of records written.
    fn upsert<'a>(&'a self, batch: Vec<(TaskFragment, Vec<f32>)>) -> IndexFuture<'a, usize>;

    /// Flushes state to durable storage when the backend needs it.
    fn persist<'a>(&'a self) -> IndexFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }
}
