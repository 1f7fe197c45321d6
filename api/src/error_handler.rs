use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contract_search::{SearchError, ValidationError};
use task_store::TaskStoreError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / server ---
    #[error("failed to bind listener on {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    // --- Pipeline ---
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            AppError::Search(e) => match e {
                SearchError::Validation(_) => StatusCode::BAD_REQUEST,
                SearchError::Store(s) => store_status(s),
                SearchError::Llm { .. } | SearchError::EmptyCompletion { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                SearchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                SearchError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::Store(s) => store_status(s),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",

            AppError::Search(e) => match e {
                SearchError::Validation(_) => "VALIDATION_FAILED",
                SearchError::Store(s) => store_code(s),
                SearchError::Llm { .. } | SearchError::EmptyCompletion { .. } => "PROVIDER_FAILED",
                SearchError::Timeout { .. } => "PROVIDER_TIMEOUT",
                SearchError::Unavailable => "UNAVAILABLE",
            },
            AppError::Store(s) => store_code(s),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Search(e) => e.is_retryable(),
            AppError::Store(e) => e.is_transient(),
            AppError::Bind { .. } | AppError::Server(_) | AppError::BadRequest(_) => false,
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        let AppError::Search(SearchError::Validation(v)) = self else {
            return Vec::new();
        };
        let (path, hint) = match v {
            ValidationError::EmptyQuery => ("query", "pass a non-blank search text".to_string()),
            ValidationError::TopNZero => ("top_n", "use a value of at least 1".to_string()),
            ValidationError::TopNTooLarge { max, .. } => {
                ("top_n", format!("use a value between 1 and {max}"))
            }
        };
        vec![ApiErrorDetail::field(path, hint)]
    }
}

fn store_status(e: &TaskStoreError) -> StatusCode {
    match e {
        TaskStoreError::Embedding(_) => StatusCode::BAD_GATEWAY,
        TaskStoreError::Config(_) | TaskStoreError::Parse { .. } => StatusCode::BAD_REQUEST,
        TaskStoreError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_code(e: &TaskStoreError) -> &'static str {
    match e {
        TaskStoreError::Embedding(_) => "PROVIDER_FAILED",
        TaskStoreError::Config(_) => "CONFIG_ERROR",
        TaskStoreError::Parse { .. } => "INVALID_TASK_FILE",
        TaskStoreError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => "TASK_FILE_NOT_FOUND",
        _ => "INDEX_FAILED",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        let body: ApiResponse<()> = ApiResponse::error(
            self.error_code(),
            self.to_string(),
            self.is_retryable(),
            self.details(),
        );
        body.into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ai_llm_service::AiLlmError;

    use super::*;

    #[test]
    fn validation_maps_to_400_with_field_hint() {
        let err = AppError::from(SearchError::from(ValidationError::TopNTooLarge {
            got: 50,
            max: 20,
        }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(!err.is_retryable());
        let details = err.details();
        assert_eq!(details[0].path.as_deref(), Some("top_n"));
    }

    #[test]
    fn provider_errors_are_gateway_failures() {
        let llm = AppError::from(SearchError::Llm {
            stage: "summary",
            source: AiLlmError::Timeout(Duration::from_secs(1)),
        });
        assert_eq!(llm.status_code(), StatusCode::BAD_GATEWAY);
        assert!(llm.is_retryable());

        let timeout = AppError::from(SearchError::Timeout {
            stage: "retrieval",
            after: Duration::from_secs(60),
        });
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.error_code(), "PROVIDER_TIMEOUT");

        let embed = AppError::from(SearchError::Store(TaskStoreError::Embedding(
            AiLlmError::Timeout(Duration::from_secs(1)),
        )));
        assert_eq!(embed.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn index_failures_are_internal() {
        let err = AppError::from(SearchError::Store(TaskStoreError::Qdrant("down".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INDEX_FAILED");
    }

    #[test]
    fn missing_task_file_is_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AppError::from(TaskStoreError::Io(io));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "TASK_FILE_NOT_FOUND");
    }
}
