//! Text-generation seam used by the narration pass.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{AiLlmError, LlmServiceProfiles, Profile};
use tracing::trace;

use crate::prompt::{DEFAULT_SYSTEM, PromptTemplate, PromptVars, render};

/// Boxed completion future.
pub type Completion<'a> = Pin<Box<dyn Future<Output = Result<String, AiLlmError>> + Send + 'a>>;

/// Stateless completion function: `(template, variables) -> text`.
///
/// Substitute a fake in tests to capture the variables of each call.
pub trait TextGenerator: Send + Sync {
    fn complete<'a>(&'a self, template: PromptTemplate, vars: &'a PromptVars) -> Completion<'a>;
}

/// [`TextGenerator`] backed by the shared LLM profiles.
///
/// Explanations go to the `fast` profile and the summary to the `slow` one.
pub struct LlmGenerator {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl TextGenerator for LlmGenerator {
    fn complete<'a>(&'a self, template: PromptTemplate, vars: &'a PromptVars) -> Completion<'a> {
        Box::pin(async move {
            let prompt = render(template, vars);
            trace!(template = template.id(), prompt_len = prompt.len(), "rendered prompt");
            let profile = match template {
                PromptTemplate::Explanation => Profile::Fast,
                PromptTemplate::Summary => Profile::Slow,
            };
            let out = self
                .svc
                .generate(profile, &prompt, Some(DEFAULT_SYSTEM))
                .await?;
            Ok(out.trim().to_string())
        })
    }
}
