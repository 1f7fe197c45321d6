//! Default LLM configs loaded strictly from environment variables.
//!
//! Convenience constructors for [`LlmModelConfig`], grouped by provider and
//! role:
//!
//! - **Slow**      → final summary
//! - **Fast**      → per-contract explanations
//! - **Embedding** → query / task embeddings (must match the indexed vectors)
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`ollama` | `openai`, default `ollama`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = slow model (mandatory)
//! - `OLLAMA_MODEL_FAST`           = fast model (optional, falls back to slow)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//!
//! OpenAI:
//! - `OPENAI_API_KEY`         = API key (mandatory)
//! - `OPENAI_URL`             = endpoint (default `https://api.openai.com`)
//! - `OPENAI_MODEL`           = chat model (default `gpt-3.5-turbo`)
//! - `OPENAI_EMBEDDING_MODEL` = embedding model (default `text-embedding-ada-002`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, must_env, opt_env},
    service_profiles::LlmServiceProfiles,
};

/// Builds [`LlmServiceProfiles`] for the provider selected by `LLM_KIND`.
///
/// # Errors
/// Propagates missing/invalid environment variables and client setup errors.
pub fn profiles_from_env() -> Result<LlmServiceProfiles, AiLlmError> {
    let kind = opt_env("LLM_KIND")
        .map(|k| k.parse::<LlmProvider>())
        .transpose()?
        .unwrap_or(LlmProvider::Ollama);

    let (fast, slow, embedding) = match kind {
        LlmProvider::Ollama => (
            config_ollama_fast()?,
            config_ollama_slow()?,
            config_ollama_embedding()?,
        ),
        LlmProvider::OpenAI => {
            let chat = config_openai_chat()?;
            (chat.clone(), chat, config_openai_embedding()?)
        }
    };

    LlmServiceProfiles::new(fast, Some(slow), embedding, Some(10))
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

/// Config for the **slow** Ollama model.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS` (optional)
pub fn config_ollama_slow() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(600),
    })
}

/// Config for the **fast** Ollama model.
///
/// # Env
/// - `OLLAMA_MODEL_FAST` (optional, falls back to `OLLAMA_MODEL`)
/// - `LLM_MAX_TOKENS` (optional)
pub fn config_ollama_fast() -> Result<LlmModelConfig, AiLlmError> {
    let model = match opt_env("OLLAMA_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OLLAMA_MODEL")?,
    };

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(120),
    })
}

/// Config for the **embedding** Ollama model.
///
/// # Env
/// - `EMBEDDING_MODEL` (required)
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}

/// Config for the OpenAI chat model (used for both fast and slow roles).
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_URL`, `OPENAI_MODEL`, `LLM_MAX_TOKENS` (optional)
pub fn config_openai_chat() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".into()),
        endpoint: openai_endpoint(),
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(120),
    })
}

/// Config for the OpenAI embedding model.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_URL`, `OPENAI_EMBEDDING_MODEL` (optional)
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: opt_env("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|| "text-embedding-ada-002".into()),
        endpoint: openai_endpoint(),
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}

fn openai_endpoint() -> String {
    opt_env("OPENAI_URL").unwrap_or_else(|| "https://api.openai.com".into())
}
