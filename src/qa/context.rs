//! Context builder for retrieval-augmented prompts

use crate::store::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Context assembly configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum tokens of retrieved context stuffed into the prompt
    pub max_context_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 2000,
        }
    }
}

/// Assembled context block
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// The formatted context text
    pub text: String,
    /// Number of chunks included
    pub chunk_count: usize,
    /// Estimated token count (~4 chars per token)
    pub estimated_tokens: usize,
    /// Source paths of the included chunks
    pub sources: Vec<String>,
}

/// Builds the context block for the QA prompt
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Assemble retrieved chunks into a context block, stopping at the
    /// token budget
    pub fn build(&self, chunks: &[ScoredChunk]) -> AssembledContext {
        let mut parts = Vec::new();
        let mut total_tokens = 0;
        let mut sources = Vec::new();

        for (idx, scored) in chunks.iter().enumerate() {
            // Rough token estimate: ~4 chars per token
            let chunk_tokens = scored.chunk.content.len() / 4;

            if total_tokens + chunk_tokens > self.config.max_context_tokens && !parts.is_empty() {
                break;
            }

            parts.push(format!(
                "[Document {}] (source: {}, score: {:.2})\n{}",
                idx + 1,
                scored.chunk.source.display(),
                scored.score,
                scored.chunk.content
            ));
            total_tokens += chunk_tokens;

            let source = scored.chunk.source.display().to_string();
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        let chunk_count = parts.len();
        AssembledContext {
            text: parts.join("\n\n"),
            chunk_count,
            estimated_tokens: total_tokens,
            sources,
        }
    }

    /// Build the final "stuff"-style QA prompt
    ///
    /// With no retrieved chunks the question is passed through bare.
    pub fn build_qa_prompt(&self, question: &str, chunks: &[ScoredChunk]) -> String {
        let context = self.build(chunks);

        if context.chunk_count == 0 {
            return question.to_string();
        }

        format!(
            "Use the following pieces of context to answer the question at the end. \
             If you don't know the answer, just say that you don't know, don't try \
             to make up an answer.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
            context.text, question
        )
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::Chunk;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scored(content: &str, source: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                source: PathBuf::from(source),
                chunk_index: 0,
                content: content.to_string(),
            },
            score,
        }
    }

    #[test]
    fn test_build_empty() {
        let builder = ContextBuilder::new();
        let context = builder.build(&[]);
        assert_eq!(context.chunk_count, 0);
        assert_eq!(context.estimated_tokens, 0);
        assert!(context.text.is_empty());
    }

    #[test]
    fn test_build_single_chunk() {
        let builder = ContextBuilder::new();
        let chunks = vec![scored("fn main() {}", "src/main.rs", 0.91)];

        let context = builder.build(&chunks);
        assert_eq!(context.chunk_count, 1);
        assert!(context.text.contains("[Document 1]"));
        assert!(context.text.contains("src/main.rs"));
        assert!(context.text.contains("fn main() {}"));
        assert_eq!(context.sources, vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn test_build_respects_token_budget() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: 10,
        });

        let chunks = vec![
            scored(&"a".repeat(36), "one.rs", 0.9),
            scored(&"b".repeat(400), "two.rs", 0.8),
        ];

        let context = builder.build(&chunks);
        assert_eq!(context.chunk_count, 1);
        assert_eq!(context.sources, vec!["one.rs".to_string()]);
    }

    #[test]
    fn test_sources_deduplicated() {
        let builder = ContextBuilder::new();
        let chunks = vec![
            scored("first", "lib.rs", 0.9),
            scored("second", "lib.rs", 0.8),
        ];

        let context = builder.build(&chunks);
        assert_eq!(context.chunk_count, 2);
        assert_eq!(context.sources.len(), 1);
    }

    #[test]
    fn test_qa_prompt_contains_context_and_question() {
        let builder = ContextBuilder::new();
        let chunks = vec![scored("pub fn add(a: i32, b: i32) -> i32", "math.rs", 0.95)];

        let prompt = builder.build_qa_prompt("What does add do?", &chunks);
        assert!(prompt.contains("pub fn add"));
        assert!(prompt.contains("Question: What does add do?"));
        assert!(prompt.contains("don't know"));
    }

    #[test]
    fn test_qa_prompt_without_context_is_bare() {
        let builder = ContextBuilder::new();
        let prompt = builder.build_qa_prompt("What is this?", &[]);
        assert_eq!(prompt, "What is this?");
    }
}
