use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ApiResponse},
    },
    error_handler::AppError,
    routes::search_task::search_task_request::SearchTaskParams,
};

/// `GET /search_task?query=<text>&top_n=<n>`
pub async fn search_task_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<SearchTaskParams>, QueryRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let Query(p) = match params {
        Ok(p) => p,
        Err(rejection) => {
            warn!(request_id = %request_id, error = %rejection, "search_task_route: bad query string");
            return AppError::from(rejection).into_response();
        }
    };

    debug!(
        request_id = %request_id,
        query = %p.query,
        top_n = ?p.top_n,
        "search_task_route: start"
    );

    match state.search.search(&p.query, p.top_n).await {
        Ok(resp) => {
            debug!(
                request_id = %request_id,
                contracts = resp.contracts.len(),
                "search_task_route: success"
            );
            ApiResponse::success(resp).into_response_with_status(StatusCode::OK)
        }
        Err(err) => {
            warn!(
                request_id = %request_id,
                error = %err,
                validation = err.is_validation(),
                "search_task_route: search failed"
            );
            AppError::from(err).into_response()
        }
    }
}
