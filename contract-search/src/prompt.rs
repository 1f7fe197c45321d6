//! Prompt templates for the narration pass.

/// Short system message shared by both templates.
pub const DEFAULT_SYSTEM: &str = "You help procurement analysts compare government contracts. \
Answer in plain prose, stay grounded in the listed tasks and do not invent obligations.";

/// Shown in place of an empty previous explanation.
const NO_PREVIOUS: &str = "(nothing yet, this is the first contract)";

/// Which prompt to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    /// Per-contract explanation chained on the previous one.
    Explanation,
    /// Final summary over every shown contract.
    Summary,
}

impl PromptTemplate {
    pub fn id(self) -> &'static str {
        match self {
            PromptTemplate::Explanation => "explanation",
            PromptTemplate::Summary => "summary",
        }
    }
}

/// Variables substituted into a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptVars {
    pub query: String,
    /// Newline-joined task texts.
    pub tasks: String,
    /// Previous explanation, or every explanation for the summary.
    pub previous_explanation: String,
}

/// Renders the user prompt for `template`.
///
/// # Example
/// ```
/// use contract_search::prompt::{PromptTemplate, PromptVars, render};
/// let vars = PromptVars {
///     query: "help desk".into(),
///     tasks: "Staff a tier-1 help desk".into(),
///     previous_explanation: String::new(),
/// };
/// let p = render(PromptTemplate::Explanation, &vars);
/// assert!(p.contains("Staff a tier-1 help desk"));
/// ```
pub fn render(template: PromptTemplate, vars: &PromptVars) -> String {
    let previous = match vars.previous_explanation.trim() {
        "" => NO_PREVIOUS,
        p => p,
    };
    let query = vars.query.trim();
    let tasks = vars.tasks.trim();

    match template {
        PromptTemplate::Explanation => format!(
            "Search query:\n\"{query}\"\n\n\
             Tasks from a contract that matched the search:\n{tasks}\n\n\
             Your explanation for the previous contract:\n\"{previous}\"\n\n\
             In one or two sentences, pick up where the previous explanation left off \
             and say how this contract's tasks still relate to the search query."
        ),
        PromptTemplate::Summary => format!(
            "Search query:\n\"{query}\"\n\n\
             All tasks from the closest contracts:\n{tasks}\n\n\
             Explanations given so far:\n\"{previous}\"\n\n\
             Write a closing summary of why these tasks relate to the search query. \
             Then say whether these contracts could be consolidated because of \
             thematic or functional overlap."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(prev: &str) -> PromptVars {
        PromptVars {
            query: " develop software test plan ".into(),
            tasks: "Write the test plan\nRun regression tests".into(),
            previous_explanation: prev.into(),
        }
    }

    #[test]
    fn explanation_carries_previous_text() {
        let p = render(PromptTemplate::Explanation, &vars("Contract A builds test plans."));
        assert!(p.contains("\"develop software test plan\""));
        assert!(p.contains("Contract A builds test plans."));
        assert!(!p.contains(NO_PREVIOUS));
    }

    #[test]
    fn first_explanation_gets_placeholder() {
        let p = render(PromptTemplate::Explanation, &vars(""));
        assert!(p.contains(NO_PREVIOUS));
    }

    #[test]
    fn summary_asks_about_consolidation() {
        let p = render(PromptTemplate::Summary, &vars("a\nb"));
        assert!(p.contains("consolidated"));
        assert!(p.contains("Run regression tests"));
    }
}
