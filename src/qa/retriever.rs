//! Retriever - embeds a query and searches the vector store

use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingEngine;
use crate::errors::{PipelineError, Result};
use crate::store::{ScoredChunk, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Search parameters for retrieval
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Maximum number of chunks to retrieve
    pub top_k: usize,
    /// Minimum cosine similarity (0 disables the filter)
    pub score_threshold: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: 0.0,
        }
    }
}

impl From<RetrievalConfig> for RetrievalParams {
    fn from(config: RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            score_threshold: config.score_threshold,
        }
    }
}

/// Semantic retriever over the chunk index
pub struct Retriever {
    engine: Arc<EmbeddingEngine>,
    store: Arc<VectorStore>,
    params: RetrievalParams,
}

impl Retriever {
    /// Create a retriever sharing the pipeline's engine and store
    pub fn new(engine: Arc<EmbeddingEngine>, store: Arc<VectorStore>, params: RetrievalParams) -> Self {
        Self {
            engine,
            store,
            params,
        }
    }

    /// Retrieve the chunks most relevant to `query`
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retrieve_with_params(query, &self.params).await
    }

    /// Retrieve with one-off parameters
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        params: &RetrievalParams,
    ) -> Result<Vec<ScoredChunk>> {
        let embedding = self
            .engine
            .embed(query)
            .map_err(|e| PipelineError::EmbeddingError(format!("{e:#}")))?;

        self.store
            .search(&embedding, params.top_k, params.score_threshold)
            .await
            .map_err(|e| PipelineError::VectorStoreError(format!("{e:#}")))
    }

    /// Default parameters this retriever was built with
    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default() {
        let params = RetrievalParams::default();
        assert_eq!(params.top_k, 4);
        assert_eq!(params.score_threshold, 0.0);
    }

    #[test]
    fn test_params_from_config() {
        let config = RetrievalConfig {
            top_k: 1,
            score_threshold: 0.7,
        };
        let params = RetrievalParams::from(config);
        assert_eq!(params.top_k, 1);
        assert_eq!(params.score_threshold, 0.7);
    }
}
