//! Ollama API streaming client
//!
//! Real-time token streaming from Ollama:
//! - HTTP/1.1 streaming via reqwest
//! - Endpoint: POST /api/generate
//! - Newline-delimited JSON chunks, decoded incrementally

use crate::errors::{PipelineError, Result};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Request timeout (5 minutes; local models can be slow on first load)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Ollama streaming client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaClient {
    /// Create an Ollama client for a model tag
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PipelineError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            temperature: None,
        })
    }

    /// Set the sampling temperature sent with every request
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Generate a completion, invoking `on_token` for every streamed token
    pub async fn generate_with<F>(&self, prompt: &str, mut on_token: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/api/generate", self.base_url);

        let options = self
            .temperature
            .map(|t| serde_json::json!({ "temperature": t }));

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: true,
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::OllamaApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::OllamaApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut output = String::new();

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| PipelineError::StreamingError(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Drain complete NDJSON lines; a partial line stays buffered
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let chunk: GenerateChunk = serde_json::from_str(line).map_err(|e| {
                    PipelineError::StreamingError(format!("Malformed stream chunk: {}", e))
                })?;

                if !chunk.response.is_empty() {
                    on_token(&chunk.response);
                    output.push_str(&chunk.response);
                }

                if chunk.done {
                    return Ok(output);
                }
            }
        }

        Ok(output)
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List installed model tags
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::OllamaApiError(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::OllamaApiError(
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::OllamaApiError(format!("Failed to parse models: {}", e)))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Check if a model tag is installed
    pub async fn has_model(&self, name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m == name || m.starts_with(&format!("{name}:"))))
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with(prompt, |_| {}).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

/// One NDJSON chunk of a streamed generation
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
