//! Shared LLM access layer for contract-scout.
//!
//! Provides provider configs (Ollama / OpenAI), thin HTTP clients for text
//! generation and embeddings, a profile-based facade reused across queries,
//! provider health probes and a library-scoped tracing layer.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod response_shape;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::{
    default_config::profiles_from_env, llm_model_config::LlmModelConfig, llm_provider::LlmProvider,
};
pub use error_handler::{AiLlmError, Result};
pub use service_profiles::{LlmServiceProfiles, Profile};
