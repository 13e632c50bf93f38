//! Retrieval QA chain

pub mod chain;
pub mod context;
pub mod retriever;

pub use chain::{QaChain, QaResponse};
pub use context::{AssembledContext, ContextBuilder};
pub use retriever::{RetrievalParams, Retriever};
