//! Language model abstraction and Ollama client

pub mod client;

pub use client::{OllamaClient, DEFAULT_OLLAMA_URL};

use crate::errors::Result;
use async_trait::async_trait;

/// Seam between the pipeline and the model runtime
///
/// The QA chain and the analysis agent only ever see this trait, so tests
/// can swap in a scripted model and the Ollama runtime stays external.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model tag served by this client
    fn model_name(&self) -> &str;
}
