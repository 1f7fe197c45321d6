//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One extracted contractor obligation, tagged with its source contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskFragment {
    pub text: String,
    pub contract_id: String,
}

impl TaskFragment {
    pub fn new(text: impl Into<String>, contract_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            contract_id: contract_id.into(),
        }
    }
}

/// A single k-NN result.
///
/// `distance` is lower-is-better regardless of the backend's native score.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievalHit {
    pub fragment: TaskFragment,
    pub distance: f32,
}

/// One line of the extractor output.
///
/// Either a single fragment or a per-contract bundle of task strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestRow {
    Bundle {
        contract_id: String,
        tasks: Vec<String>,
    },
    Fragment {
        text: String,
        contract_id: String,
    },
}

impl IngestRow {
    /// Flattens the row into trimmed, non-empty fragments.
    pub fn into_fragments(self) -> Vec<TaskFragment> {
        match self {
            IngestRow::Fragment { text, contract_id } => {
                let text = text.trim();
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![TaskFragment::new(text, contract_id)]
                }
            }
            IngestRow::Bundle { contract_id, tasks } => tasks
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| TaskFragment::new(t, contract_id.as_str()))
                .collect(),
        }
    }
}

/// Record persisted by the flat index: fragment plus its vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct StoredVector {
    pub text: String,
    pub contract_id: String,
    pub embedding: Vec<f32>,
}
