//! codebuddy - Chat with your codebase
//!
//! Retrieval-augmented code analysis on local Ollama models. Documents
//! are loaded from a directory, split into overlapping chunks, embedded
//! locally via Candle, indexed in Qdrant, and queried through a
//! retrieval QA chain; a fixed three-step agent turns answers and
//! retrieved code into analysis, explanation, and improvement text.
//!
//! # Pipeline
//!
//! 1. load & preprocess documents ([`loader`], [`splitter`])
//! 2. create embeddings & vector store ([`embedding`], [`store`])
//! 3. initialise QA chain & analysis agent ([`qa`], [`agent`])
//! 4. process user queries ([`pipeline`])

pub mod errors;
pub mod config;
pub mod cli;
pub mod loader;
pub mod splitter;
pub mod embedding;
pub mod store;
pub mod llm;
pub mod qa;
pub mod agent;
pub mod pipeline;
pub mod telemetry;
pub mod doctor;

// Re-export commonly used types
pub use errors::{PipelineError, Result};
pub use pipeline::{CodeAnalysisPipeline, QueryOptions, QueryOutcome};
