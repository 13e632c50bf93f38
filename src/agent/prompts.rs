//! Prompt templates for the analysis workflow

use crate::agent::state::WorkflowStep;

/// System instruction for the analyze step
pub const ANALYZE_PROMPT: &str =
    "You are a code analysis expert. Analyze the following code and provide insights.";

/// System instruction for the explain step
pub const EXPLAIN_PROMPT: &str =
    "You are an expert at explaining technical concepts. Explain the following analysis in simpler terms.";

/// System instruction for the suggest step
pub const SUGGEST_PROMPT: &str =
    "You are a software optimization expert. Suggest improvements for the following code and analysis.";

/// System instruction for a workflow step
pub fn system_prompt(step: WorkflowStep) -> Option<&'static str> {
    match step {
        WorkflowStep::Analyze => Some(ANALYZE_PROMPT),
        WorkflowStep::Explain => Some(EXPLAIN_PROMPT),
        WorkflowStep::Suggest => Some(SUGGEST_PROMPT),
        WorkflowStep::Done => None,
    }
}

/// Render a system instruction plus its input into a single prompt
pub fn render(system: &str, input: &str) -> String {
    format!("{system}\n\n{input}")
}
