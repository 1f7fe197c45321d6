//! Public result types re-used by external crates (e.g., the HTTP API layer).

use serde::{Deserialize, Serialize};

/// One ranked contract with its narrated explanation.
///
/// `distance` is the contract's best (smallest) task distance: lower means
/// more similar to the query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractResult {
    pub contract_id: String,
    pub distance: f32,
    pub explanation: String,
    /// Every distinct task of the contract, closest first.
    pub tasks: Vec<String>,
}

/// Full answer to one query, best contract first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub contracts: Vec<ContractResult>,
    pub final_summary: String,
}
