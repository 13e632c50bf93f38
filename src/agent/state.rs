//! Workflow state machine for the analysis agent
//!
//! The agent runs a fixed linear workflow:
//!
//! Analyze -> Explain -> Suggest -> Done
//!
//! Transitions are validated; running a step out of order is an error
//! rather than a silent reorder.

use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Steps of the analysis workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStep {
    /// Analyze the code and gather insights
    Analyze,

    /// Explain the analysis in simpler terms
    Explain,

    /// Suggest improvements based on the full transcript
    Suggest,

    /// Workflow finished (terminal)
    Done,
}

impl WorkflowStep {
    /// Check if this is the terminal step
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStep::Done)
    }

    /// The step that follows this one
    ///
    /// Valid transitions (linear):
    /// Analyze -> Explain -> Suggest -> Done
    pub fn advance(&self) -> Result<WorkflowStep> {
        match self {
            WorkflowStep::Analyze => Ok(WorkflowStep::Explain),
            WorkflowStep::Explain => Ok(WorkflowStep::Suggest),
            WorkflowStep::Suggest => Ok(WorkflowStep::Done),
            WorkflowStep::Done => Err(PipelineError::InvalidTransition {
                from: "Done".to_string(),
                to: "(next)".to_string(),
                reason: "Workflow already completed".to_string(),
            }),
        }
    }

    /// Human-readable step name
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowStep::Analyze => "Analyzing code",
            WorkflowStep::Explain => "Explaining analysis",
            WorkflowStep::Suggest => "Suggesting improvements",
            WorkflowStep::Done => "Completed",
        }
    }
}

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Human,
    Assistant,
}

/// One transcript message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Accumulated workflow state: the transcript plus the current step
#[derive(Debug, Clone)]
pub struct WorkflowState {
    messages: Vec<Message>,
    step: WorkflowStep,
}

impl WorkflowState {
    /// Start a workflow on a piece of code
    pub fn new(code: &str) -> Self {
        Self {
            messages: vec![Message {
                role: Role::Human,
                content: code.to_string(),
            }],
            step: WorkflowStep::Analyze,
        }
    }

    /// Current workflow step
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Record a model response and advance to the next step
    pub fn complete_step(&mut self, response: String) -> Result<()> {
        if self.step.is_terminal() {
            return Err(PipelineError::InvalidTransition {
                from: "Done".to_string(),
                to: "(response)".to_string(),
                reason: "Cannot record a response after completion".to_string(),
            });
        }

        self.messages.push(Message {
            role: Role::Assistant,
            content: response,
        });
        self.step = self.step.advance()?;
        Ok(())
    }

    /// Content of the latest message
    pub fn last_content(&self) -> &str {
        // new() guarantees at least the initial human message
        &self.messages[self.messages.len() - 1].content
    }

    /// Full transcript, one message per line
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All messages so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
