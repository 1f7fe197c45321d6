//! Health probes for LLM backends (Ollama, OpenAI).
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//!
//! [`HealthService::check`] never fails: errors are mapped to `ok = false`.
//! The provider-specific probes return a strict `Result`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config, routing to the provider-specific probe.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.try_probe_openai(cfg).await,
        };

        let status = match result {
            Ok(status) => status,
            Err(err) => HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string()),
        };

        if status.ok {
            info!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                "health probe completed"
            );
        } else {
            warn!(
                provider = %status.provider,
                model = %status.model,
                latency_ms = status.latency_ms,
                message = %status.message,
                "health probe failed"
            );
        }
        status
    }

    /// Checks health for multiple configs, one after another.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", base_url(cfg)?);
        let start = Instant::now();
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .send()
            .await?;
        let latency = start.elapsed().as_millis();
        let resp = ensure_success(resp, url).await?;

        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let tags: Tags = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(format!("/api/tags: {e}")))?;

        let available = tags
            .models
            .map(|models| models.iter().any(|m| model_matches(&m.name, &cfg.model)))
            .unwrap_or(true);

        Ok(if available {
            HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available")
        } else {
            HealthStatus::new(cfg, false, latency, "Ollama is up, but model not found in /api/tags")
        })
    }

    async fn try_probe_openai(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/v1/models", base_url(cfg)?);
        let mut req = self.client.get(&url).timeout(self.timeout_for(cfg));
        if let Some(key) = &cfg.api_key {
            req = req.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();
        let resp = ensure_success(resp, url).await?;

        #[derive(Deserialize)]
        struct Model {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<Model>,
        }

        let models: Models = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(format!("/v1/models: {e}")))?;

        Ok(if models.data.iter().any(|m| m.id == cfg.model) {
            HealthStatus::new(cfg, true, latency, "OpenAI is healthy; model is available")
        } else {
            HealthStatus::new(cfg, false, latency, "OpenAI is reachable, but model is not listed")
        })
    }

    fn timeout_for(&self, cfg: &LlmModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .map_or(self.default_timeout, |t| t.min(self.default_timeout))
    }
}

fn base_url(cfg: &LlmModelConfig) -> Result<&str, HealthError> {
    let endpoint = cfg.endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/'))
    } else {
        Err(HealthError::InvalidEndpoint(cfg.endpoint.clone()))
    }
}

async fn ensure_success(
    resp: reqwest::Response,
    url: String,
) -> Result<reqwest::Response, HealthError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(HealthError::HttpStatus(HttpError {
        status,
        url,
        snippet: make_snippet(&text),
    }))
}

/// Ollama tags carry an implicit `:latest` suffix.
fn model_matches(tag: &str, model: &str) -> bool {
    tag == model || tag.strip_suffix(":latest") == Some(model)
}
