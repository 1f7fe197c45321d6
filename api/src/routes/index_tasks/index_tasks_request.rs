use serde::Deserialize;
use task_store::IngestRow;

/// Optional body of `POST /index_tasks`.
///
/// Without `tasks`, the server indexes its configured `TASKS_JSONL` file.
/// Unknown fields are rejected, so the server never opens a caller-named path.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexTasksRequest {
    #[serde(default)]
    pub tasks: Option<Vec<IngestRow>>,
}
