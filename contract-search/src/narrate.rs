//! Narration: chained per-contract explanations, then one summary.

use futures::stream::{self, TryStreamExt};
use tracing::{debug, info};

use crate::aggregate::ContractGroup;
use crate::api_types::{ContractResult, SearchResponse};
use crate::error::SearchError;
use crate::llm::TextGenerator;
use crate::prompt::{PromptTemplate, PromptVars};
use crate::retry::{RetryPolicy, with_retry};

/// Summary returned when retrieval found nothing. No provider call is made.
pub const NO_RESULTS_SUMMARY: &str = "No related tasks found for this query.";

/// Accumulator threaded through the explanation pass.
#[derive(Default)]
struct Narrative {
    previous_explanation: String,
    contracts: Vec<ContractResult>,
}

/// Explains every group in rank order, then summarizes.
///
/// Each explanation sees the previous one, so the pass is strictly
/// sequential. Only the first `tasks_shown` tasks of a group go into its
/// prompt; the result still carries all of them. Any failure aborts the
/// whole narration.
pub async fn narrate(
    generator: &dyn TextGenerator,
    retry: &RetryPolicy,
    tasks_shown: usize,
    query: &str,
    groups: Vec<ContractGroup>,
) -> Result<SearchResponse, SearchError> {
    if groups.is_empty() {
        info!("no contracts to narrate");
        return Ok(SearchResponse {
            contracts: Vec::new(),
            final_summary: NO_RESULTS_SUMMARY.to_string(),
        });
    }

    let total = groups.len();
    let narrative = stream::iter(groups.into_iter().enumerate().map(Ok::<_, SearchError>))
        .try_fold(Narrative::default(), |mut acc, (rank, group)| async move {
            let vars = PromptVars {
                query: query.to_string(),
                tasks: group
                    .tasks
                    .iter()
                    .take(tasks_shown)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n"),
                previous_explanation: std::mem::take(&mut acc.previous_explanation),
            };

            let explanation = non_blank(
                "explanation",
                with_retry(retry, "explanation", || {
                    generator.complete(PromptTemplate::Explanation, &vars)
                })
                .await?,
            )?;

            debug!(
                rank = rank + 1,
                total,
                contract_id = %group.contract_id,
                explanation_len = explanation.len(),
                "contract explained"
            );

            acc.previous_explanation = explanation.clone();
            acc.contracts.push(ContractResult {
                contract_id: group.contract_id,
                distance: group.best_distance,
                explanation,
                tasks: group.tasks,
            });
            Ok(acc)
        })
        .await?;

    let contracts = narrative.contracts;
    let summary_vars = PromptVars {
        query: query.to_string(),
        tasks: contracts
            .iter()
            .flat_map(|c| c.tasks.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        previous_explanation: contracts
            .iter()
            .map(|c| c.explanation.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };

    let final_summary = non_blank(
        "summary",
        with_retry(retry, "summary", || {
            generator.complete(PromptTemplate::Summary, &summary_vars)
        })
        .await?,
    )?;

    info!(
        contracts = contracts.len(),
        summary_len = final_summary.len(),
        "narration complete"
    );

    Ok(SearchResponse {
        contracts,
        final_summary,
    })
}

/// A blank answer would break the explanation chain, so it fails the query.
fn non_blank(stage: &'static str, text: String) -> Result<String, SearchError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SearchError::EmptyCompletion { stage });
    }
    Ok(trimmed.to_string())
}
