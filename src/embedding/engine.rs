//! Embedding engine - local sentence embeddings via Candle
//!
//! Runs a BERT-family embedding model (default: BAAI/bge-small-en-v1.5)
//! on CPU. Weights, tokenizer, and model config are fetched from the
//! HuggingFace Hub on first use and cached by hf-hub.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::DEFAULT_EMBEDDING_MODEL;

/// Subset of the model config needed outside the BERT graph
#[derive(Debug, Deserialize)]
struct ModelDims {
    hidden_size: usize,
}

/// Embedding engine over a Candle BERT model
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    model_id: String,
    dimension: usize,
}

impl EmbeddingEngine {
    /// Load the default embedding model (downloads on first use)
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_EMBEDDING_MODEL)
    }

    /// Load a specific embedding model from the HuggingFace Hub
    pub fn with_model(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;
        let dims: ModelDims = serde_json::from_str(&config_contents)
            .context("Failed to read hidden_size from model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[weights_path],
                candle_core::DType::F32,
                &device,
            )
            .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config)
            .context("Failed to create BERT model")?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            model_id: model_id.to_string(),
            dimension: dims.hidden_size,
        })
    }

    /// Generate an embedding for a single text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding batch returned no vectors"))
    }

    /// Generate embeddings for multiple texts (batched for efficiency)
    ///
    /// Output vectors are L2-normalised, so dot product equals cosine
    /// similarity.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let mut token_ids_vec = Vec::new();
        let mut attention_mask_vec = Vec::new();

        for encoding in &encodings {
            token_ids_vec.push(encoding.get_ids().to_vec());
            attention_mask_vec.push(encoding.get_attention_mask().to_vec());
        }

        let max_len = token_ids_vec.iter().map(|ids| ids.len()).max().unwrap_or(0);
        let batch_size = texts.len();

        // Pad sequences to the longest in the batch
        let mut padded_ids = vec![vec![0u32; max_len]; batch_size];
        let mut padded_mask = vec![vec![0u32; max_len]; batch_size];

        for (i, (ids, mask)) in token_ids_vec.iter().zip(attention_mask_vec.iter()).enumerate() {
            padded_ids[i][..ids.len()].copy_from_slice(ids);
            padded_mask[i][..mask.len()].copy_from_slice(mask);
        }

        let flat_ids: Vec<u32> = padded_ids.into_iter().flatten().collect();
        let flat_mask: Vec<u32> = padded_mask.into_iter().flatten().collect();

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let embeddings =
            self.model
                .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over sequence length, then L2 normalisation
        let pooled = Self::mean_pool(&embeddings, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        let embedding_data = normalized.to_vec2::<f32>()?;

        Ok(embedding_data)
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        let pooled = sum_embeddings.broadcast_div(&sum_mask)?;

        Ok(pooled)
    }

    /// Scale each row to unit length
    fn l2_normalize(tensor: &Tensor) -> Result<Tensor> {
        let norm = tensor.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
        Ok(tensor.broadcast_div(&norm)?)
    }

    /// Embedding dimension of the loaded model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// HuggingFace Hub id of the loaded model
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_default_model_dimension() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        // bge-small-en-v1.5 hidden size
        assert_eq!(engine.dimension(), 384);
        assert_eq!(engine.model_id(), DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_single_text() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embedding = engine.embed("fn main() {}").expect("Failed to embed");
        assert_eq!(embedding.len(), engine.dimension());

        // Unit-norm output
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_batch() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let texts = vec!["read a file", "write a file", "parse json"];
        let embeddings = engine.embed_batch(&texts).expect("Failed to embed batch");
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == engine.dimension()));
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_empty_batch() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embeddings = engine.embed_batch(&[]).expect("Failed to embed empty batch");
        assert_eq!(embeddings.len(), 0);
    }
}
