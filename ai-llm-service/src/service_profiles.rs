//! Shared LLM service with three profiles: `fast`, `slow`, and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - If `slow` profile is not provided, it falls back to `fast`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles, Profile};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), ai_llm_service::AiLlmError> {
//! let fast = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(512),
//!     temperature: Some(0.0),
//!     top_p: None,
//!     timeout_secs: Some(30),
//! };
//! let embedding = LlmModelConfig { model: "nomic-embed-text".into(), ..fast.clone() };
//!
//! let svc = Arc::new(LlmServiceProfiles::new(fast, None, embedding, Some(10))?);
//! let txt = svc.generate(Profile::Fast, "Hello world", None).await?;
//! let emb = svc.embed("Ferris").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Logical role a model config plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Per-contract explanations.
    Fast,
    /// Final summary.
    Slow,
    Embedding,
}

/// Holds the three profiles and one lazily built client per distinct config.
pub struct LlmServiceProfiles {
    fast: LlmModelConfig,
    slow: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: ClientCache<OllamaService>,
    openai: ClientCache<OpenAiService>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Validates and stores the profiles. `slow_opt = None` reuses `fast`.
    ///
    /// # Errors
    /// A config error for any invalid profile, or a transport error when
    /// the health checker's HTTP client cannot be built.
    pub fn new(
        fast: LlmModelConfig,
        slow_opt: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let slow = slow_opt.unwrap_or_else(|| fast.clone());
        for cfg in [&fast, &slow, &embedding] {
            cfg.validate()?;
        }

        Ok(Self {
            fast,
            slow,
            embedding,
            ollama: ClientCache::default(),
            openai: ClientCache::default(),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    pub fn config(&self, profile: Profile) -> &LlmModelConfig {
        match profile {
            Profile::Fast => &self.fast,
            Profile::Slow => &self.slow,
            Profile::Embedding => &self.embedding,
        }
    }

    /// Text completion on the given profile.
    #[instrument(skip_all, fields(profile = ?profile, model = %self.config(profile).model, prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        profile: Profile,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        let cfg = self.config(profile);
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.generate(prompt, system).await,
            LlmProvider::OpenAI => self.openai_for(cfg).await?.generate(prompt, system).await,
        }
    }

    /// One embedding vector from the embedding profile.
    #[instrument(skip_all, fields(model = %self.embedding.model, input_len = input.len()))]
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Ollama => self.ollama_for(cfg).await?.embeddings(input).await,
            LlmProvider::OpenAI => self.openai_for(cfg).await?.embeddings(input).await,
        }
    }

    /// Probes each distinct profile once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut distinct: Vec<LlmModelConfig> = Vec::with_capacity(3);
        for cfg in [&self.fast, &self.slow, &self.embedding] {
            if !distinct.contains(cfg) {
                distinct.push(cfg.clone());
            }
        }
        self.health.check_many(&distinct).await
    }

    /// `(fast, slow, embedding)`
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig, &LlmModelConfig) {
        (&self.fast, &self.slow, &self.embedding)
    }

    async fn ollama_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        self.ollama
            .get_or_try_init(ClientKey::from(cfg), || async {
                debug!(model = %cfg.model, "initializing Ollama client");
                OllamaService::new(cfg.clone())
            })
            .await
    }

    async fn openai_for(&self, cfg: &LlmModelConfig) -> Result<Arc<OpenAiService>, AiLlmError> {
        self.openai
            .get_or_try_init(ClientKey::from(cfg), || async {
                debug!(model = %cfg.model, "initializing OpenAI client");
                OpenAiService::new(cfg.clone())
            })
            .await
    }
}

/// Read-mostly map of shared clients keyed by `K`.
struct ClientCache<T, K = ClientKey> {
    inner: RwLock<HashMap<K, Arc<T>>>,
}

impl<T, K> Default for ClientCache<T, K> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<T, K: Eq + Hash> ClientCache<T, K> {
    async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<Arc<T>, AiLlmError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AiLlmError>>,
    {
        if let Some(cli) = self.inner.read().await.get(&key) {
            return Ok(Arc::clone(cli));
        }
        let mut w = self.inner.write().await;
        // Another caller may have raced us between the two locks.
        if let Some(cli) = w.get(&key) {
            return Ok(Arc::clone(cli));
        }
        let cli = Arc::new(init().await?);
        w.insert(key, Arc::clone(&cli));
        Ok(cli)
    }
}

/// Identifies configs that can share one HTTP client.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
