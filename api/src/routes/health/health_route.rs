use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub providers: Vec<HealthStatus>,
}

impl HealthReport {
    pub fn new(providers: Vec<HealthStatus>) -> Self {
        Self {
            ok: providers.iter().all(|p| p.ok),
            providers,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// `GET /health`: probes every distinct LLM profile.
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let report = HealthReport::new(state.llm.health_all().await);
    for p in report.providers.iter().filter(|p| !p.ok) {
        warn!(provider = %p.provider, model = %p.model, message = %p.message, "health_route: provider down");
    }
    let status = report.status_code();
    ApiResponse::success(report).into_response_with_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(ok: bool) -> HealthStatus {
        HealthStatus {
            provider: "Ollama".into(),
            endpoint: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            ok,
            latency_ms: 3,
            message: if ok { "ok".into() } else { "connection refused".into() },
        }
    }

    #[test]
    fn all_up_is_ok() {
        let r = HealthReport::new(vec![status(true), status(true)]);
        assert!(r.ok);
        assert_eq!(r.status_code(), StatusCode::OK);
    }

    #[test]
    fn one_down_is_unavailable() {
        let r = HealthReport::new(vec![status(true), status(false)]);
        assert!(!r.ok);
        assert_eq!(r.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
