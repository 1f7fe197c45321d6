use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{Result, validate_http_endpoint, validate_range_f32};
use crate::error_handler::ConfigError;

/// Configuration for one model invocation profile.
///
/// # Fields
///
/// - `provider`: which backend to use (Ollama, OpenAI).
/// - `model`: model identifier (e.g. `"gpt-3.5-turbo"`, `"qwen3:14b"`).
/// - `endpoint`: base URL of the inference server.
/// - `api_key`: optional key for providers that require authentication.
/// - `max_tokens`: maximum number of tokens to generate.
/// - `temperature`: sampling temperature (0.0 = deterministic).
/// - `top_p`: nucleus sampling cutoff.
/// - `timeout_secs`: HTTP request timeout.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "gpt-3.5-turbo".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(512),
///     temperature: Some(0.0),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (base URL).
    pub endpoint: String,

    /// Optional API key for authentication (e.g., OpenAI).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks the fields that would otherwise fail on the first request.
    ///
    /// # Errors
    /// Returns a config error for an empty model, a non-HTTP endpoint, or
    /// sampling parameters outside their ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn accepts_sane_config() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_bad_endpoint_and_ranges() {
        let mut cfg = base();
        cfg.endpoint = "localhost:11434".into();
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.top_p = Some(1.5);
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.model = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
