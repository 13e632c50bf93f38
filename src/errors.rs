//! Error types for the codebuddy pipeline
//!
//! Provides a single error enum for the crate seam with context
//! propagation from the underlying HTTP, serialization, and I/O layers.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the code analysis pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Workflow step ordering errors
    #[error("Invalid workflow transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// No documents found under the corpus root
    #[error("No documents found under {root}")]
    EmptyCorpus { root: PathBuf },

    /// Chunking errors
    #[error("Text splitting failed: {0}")]
    SplitError(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Vector store errors
    #[error("Vector store error: {0}")]
    VectorStoreError(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApiError(String),

    /// Streaming errors
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Pipeline error: {0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Convert anyhow errors to PipelineError
impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Generic(format!("{err:#}"))
    }
}
