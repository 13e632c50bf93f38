//! Analysis agent - fixed three-step workflow over a language model
//!
//! analyze -> explain -> suggest. The analyze and explain steps each see
//! the latest message; the suggest step sees the full transcript.

use crate::agent::prompts;
use crate::agent::state::{WorkflowState, WorkflowStep};
use crate::errors::{PipelineError, Result};
use crate::llm::LanguageModel;
use std::sync::Arc;

/// Output of a completed workflow run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub analysis: String,
    pub explanation: String,
    pub improvements: String,
}

/// Code analysis agent
pub struct AnalysisAgent {
    model: Arc<dyn LanguageModel>,
}

impl AnalysisAgent {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Run the full workflow on a piece of code
    pub async fn run(&self, code: &str) -> Result<AnalysisReport> {
        let mut state = WorkflowState::new(code);

        while !state.step().is_terminal() {
            let response = self.run_step(&state).await?;
            state.complete_step(response)?;
        }

        Self::report_from(&state)
    }

    /// Execute the current step's prompt against the model
    async fn run_step(&self, state: &WorkflowState) -> Result<String> {
        let step = state.step();
        let system = prompts::system_prompt(step).ok_or_else(|| {
            PipelineError::InvalidTransition {
                from: "Done".to_string(),
                to: "(step)".to_string(),
                reason: "No prompt for a terminal step".to_string(),
            }
        })?;

        // The suggest step reasons over everything said so far
        let input = match step {
            WorkflowStep::Suggest => state.transcript(),
            _ => state.last_content().to_string(),
        };

        let prompt = prompts::render(system, &input);
        self.model.generate(&prompt).await
    }

    /// Extract the report from a completed transcript
    fn report_from(state: &WorkflowState) -> Result<AnalysisReport> {
        let messages = state.messages();
        if messages.len() < 4 {
            return Err(PipelineError::Generic(format!(
                "Workflow transcript incomplete: {} messages",
                messages.len()
            )));
        }

        Ok(AnalysisReport {
            analysis: messages[1].content.clone(),
            explanation: messages[2].content.clone(),
            improvements: messages[3].content.clone(),
        })
    }

    /// Model tag driving the workflow
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Model that replays scripted responses and records prompts
    struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| PipelineError::Generic("Script exhausted".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_run_produces_three_part_report() {
        let model = Arc::new(ScriptedModel::new(vec![
            "the analysis",
            "the explanation",
            "the improvements",
        ]));
        let agent = AnalysisAgent::new(model.clone());

        let report = agent.run("fn main() {}").await.unwrap();
        assert_eq!(report.analysis, "the analysis");
        assert_eq!(report.explanation, "the explanation");
        assert_eq!(report.improvements, "the improvements");
    }

    #[tokio::test]
    async fn test_step_prompts_route_correct_input() {
        let model = Arc::new(ScriptedModel::new(vec!["A", "B", "C"]));
        let agent = AnalysisAgent::new(model.clone());
        agent.run("let x = 1;").await.unwrap();

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 3);

        // Analyze sees the code
        assert!(prompts[0].starts_with(prompts::ANALYZE_PROMPT));
        assert!(prompts[0].contains("let x = 1;"));

        // Explain sees the analysis output, not the original code
        assert!(prompts[1].starts_with(prompts::EXPLAIN_PROMPT));
        assert!(prompts[1].contains('A'));
        assert!(!prompts[1].contains("let x = 1;"));

        // Suggest sees the whole transcript
        assert!(prompts[2].starts_with(prompts::SUGGEST_PROMPT));
        assert!(prompts[2].contains("let x = 1;"));
        assert!(prompts[2].contains('A'));
        assert!(prompts[2].contains('B'));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::new(vec!["only one response"]));
        let agent = AnalysisAgent::new(model);

        let result = agent.run("code").await;
        assert!(result.is_err());
    }
}
