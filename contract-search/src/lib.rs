//! Contract search: similar tasks grouped per contract, narrated by an LLM.
//!
//! Public entry point is [`TaskSearch::search`]. It validates the request,
//! over-fetches `top_n²` task fragments from the index, folds them into
//! per-contract groups ranked by their closest task, then walks the ranking
//! once to write chained explanations and finishes with a summary.

mod cfg;
mod error;
mod narrate;
mod retry;

pub mod aggregate;
pub mod api_types;
pub mod llm;
pub mod prompt;

pub use aggregate::ContractGroup;
pub use api_types::{ContractResult, SearchResponse};
pub use cfg::SearchConfig;
pub use error::{SearchError, ValidationError};
pub use llm::{Completion, LlmGenerator, TextGenerator};
pub use narrate::NO_RESULTS_SUMMARY;
pub use retry::{RetryPolicy, with_retry};

use std::sync::Arc;

use task_store::TaskStore;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, instrument};

/// Query service shared across requests.
///
/// Holds the injected store and generator; no global state.
pub struct TaskSearch {
    store: Arc<TaskStore>,
    generator: Arc<dyn TextGenerator>,
    cfg: SearchConfig,
    permits: Semaphore,
}

impl TaskSearch {
    pub fn new(store: Arc<TaskStore>, generator: Arc<dyn TextGenerator>, cfg: SearchConfig) -> Self {
        let cfg = cfg.normalized();
        Self {
            permits: Semaphore::new(cfg.max_in_flight),
            store,
            generator,
            cfg,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Checks the request and resolves the effective `top_n`.
    ///
    /// # Errors
    /// [`ValidationError`] for a blank query or an out-of-range `top_n`.
    pub fn validate(&self, query: &str, top_n: Option<usize>) -> Result<usize, ValidationError> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        match top_n.unwrap_or(self.cfg.default_top_n) {
            0 => Err(ValidationError::TopNZero),
            n if n > self.cfg.max_top_n => Err(ValidationError::TopNTooLarge {
                got: n,
                max: self.cfg.max_top_n,
            }),
            n => Ok(n),
        }
    }

    /// Runs the full pipeline for one query.
    ///
    /// # Errors
    /// Validation errors before any provider call; otherwise index, provider
    /// or timeout failures. No partial response is ever returned.
    #[instrument(skip_all, fields(query_len = query.len(), top_n = ?top_n))]
    pub async fn search(
        &self,
        query: &str,
        top_n: Option<usize>,
    ) -> Result<SearchResponse, SearchError> {
        let top_n = self.validate(query, top_n)?;
        let query = query.trim();

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SearchError::Unavailable)?;

        let groups = self.retrieve(query, top_n).await?;
        let response = self.narrate(query, groups).await?;

        info!(contracts = response.contracts.len(), "search finished");
        Ok(response)
    }

    /// Retrieval-aggregation stage, bounded by the per-call timeout.
    pub async fn retrieve(
        &self,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<ContractGroup>, SearchError> {
        let after = self.cfg.retry.call_timeout;
        timeout(after, aggregate::retrieve(&self.store, query, top_n))
            .await
            .map_err(|_| SearchError::Timeout {
                stage: "retrieval",
                after,
            })?
            .map_err(SearchError::from)
    }

    /// Narration stage over already ranked groups.
    pub async fn narrate(
        &self,
        query: &str,
        groups: Vec<ContractGroup>,
    ) -> Result<SearchResponse, SearchError> {
        narrate::narrate(
            self.generator.as_ref(),
            &self.cfg.retry,
            self.cfg.tasks_shown,
            query,
            groups,
        )
        .await
    }
}
