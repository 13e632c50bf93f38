//! Retrieval QA chain
//!
//! retrieve -> stuff context into the prompt -> generate. The chain only
//! sees the `LanguageModel` trait, so any model runtime (or a test mock)
//! can sit behind it.

use crate::errors::Result;
use crate::llm::LanguageModel;
use crate::qa::context::ContextBuilder;
use crate::qa::retriever::Retriever;
use crate::store::ScoredChunk;
use std::sync::Arc;

/// Prompt used by `elaborate` to expand a QA answer
const ELABORATION_TEMPLATE: &str = "Analyze and explain the following result:\n{result}\n\n\
Please provide:\n\
1. A summary of the main points\n\
2. Any technical concepts mentioned and their explanations\n\
3. Potential implications or applications of this information";

/// Answer produced by the QA chain
#[derive(Debug, Clone)]
pub struct QaResponse {
    pub answer: String,
    /// Chunks the answer was grounded on, best match first
    pub sources: Vec<ScoredChunk>,
}

/// Retrieval QA chain
pub struct QaChain {
    model: Arc<dyn LanguageModel>,
    retriever: Retriever,
    builder: ContextBuilder,
}

impl QaChain {
    pub fn new(model: Arc<dyn LanguageModel>, retriever: Retriever) -> Self {
        Self {
            model,
            retriever,
            builder: ContextBuilder::new(),
        }
    }

    /// Answer a question against the indexed corpus
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        let chunks = self.retriever.retrieve(question).await?;
        let prompt = self.builder.build_qa_prompt(question, &chunks);
        let answer = self.model.generate(&prompt).await?;

        Ok(QaResponse {
            answer: answer.trim().to_string(),
            sources: chunks,
        })
    }

    /// Expand a QA answer into a structured explanation
    pub async fn elaborate(&self, result: &str) -> Result<String> {
        let prompt = ELABORATION_TEMPLATE.replace("{result}", result);
        let explanation = self.model.generate(&prompt).await?;
        Ok(explanation.trim().to_string())
    }

    /// Retriever backing this chain
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Model tag answering the questions
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elaboration_template_substitution() {
        let prompt = ELABORATION_TEMPLATE.replace("{result}", "the add function sums two ints");
        assert!(prompt.contains("the add function sums two ints"));
        assert!(!prompt.contains("{result}"));
        assert!(prompt.contains("summary of the main points"));
    }
}
