use serde::Deserialize;

/// Query string of `GET /search_task`.
#[derive(Debug, Deserialize)]
pub struct SearchTaskParams {
    pub query: String,
    /// Contracts to return; the configured default when absent.
    #[serde(default)]
    pub top_n: Option<usize>,
}
