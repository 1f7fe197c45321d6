use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use task_store::{IngestReport, TaskStoreError};
use tracing::{error, info};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ApiResponse},
    },
    error_handler::AppError,
    routes::index_tasks::index_tasks_request::IndexTasksRequest,
};

/// `POST /index_tasks`: embeds task fragments and upserts them into the index.
pub async fn index_tasks_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = request_id(&headers);

    let req: IndexTasksRequest = if body.iter().all(u8::is_ascii_whitespace) {
        IndexTasksRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => return AppError::BadRequest(format!("invalid JSON body: {e}")).into_response(),
        }
    };

    let store = state.search.store();
    let result: Result<IngestReport, TaskStoreError> = match req.tasks {
        Some(rows) => {
            let fragments = rows.into_iter().flat_map(|r| r.into_fragments()).collect();
            store.ingest_fragments(fragments).await
        }
        None => {
            info!(request_id = %request_id, "index_tasks_route: indexing configured file");
            store.ingest_default().await
        }
    };

    match result {
        Ok(report) => {
            info!(
                request_id = %request_id,
                read = report.read,
                unique = report.unique,
                indexed = report.indexed,
                "index_tasks_route: done"
            );
            ApiResponse::success(report).into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "index_tasks_route: failed");
            AppError::from(err).into_response()
        }
    }
}
