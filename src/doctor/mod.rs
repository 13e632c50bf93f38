//! Doctor command for environment diagnostics
//!
//! Health checks for everything the pipeline depends on: the Ollama API,
//! the configured models, the Qdrant service, and the embedding model
//! cache.

use crate::config::Config;
use crate::llm::OllamaClient;
use crate::store::VectorStore;
use std::time::Duration;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub hint: Option<String>,
}

impl HealthCheck {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Pass,
            hint: None,
        }
    }

    fn fail(name: &str, reason: String, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Fail(reason),
            hint: (!hint.is_empty()).then(|| hint.to_string()),
        }
    }

    fn warn(name: &str, reason: String, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Warn(reason),
            hint: (!hint.is_empty()).then(|| hint.to_string()),
        }
    }
}

/// Doctor diagnostics
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let ollama = self.check_ollama_api().await;
        let ollama_up = ollama.status == HealthStatus::Pass;
        checks.push(ollama);

        if ollama_up {
            checks.push(self.check_chat_model().await);
            checks.push(self.check_analysis_model().await);
        }

        checks.push(self.check_qdrant().await);
        checks.push(self.check_embedding_cache());

        checks
    }

    /// Whether any required check failed
    pub fn has_failures(checks: &[HealthCheck]) -> bool {
        checks
            .iter()
            .any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }

    /// Check 1: Ollama API reachable
    async fn check_ollama_api(&self) -> HealthCheck {
        let client = match OllamaClient::new(&self.config.ollama.base_url(), &self.config.models.chat)
        {
            Ok(client) => client,
            Err(e) => {
                return HealthCheck::fail(
                    "Ollama API",
                    format!("Could not build client: {e}"),
                    "Check the [ollama] host/port settings",
                )
            }
        };

        match client.health_check().await {
            Ok(true) => HealthCheck::pass("Ollama API"),
            _ => HealthCheck::fail(
                "Ollama API",
                format!("Not reachable at {}", self.config.ollama.base_url()),
                "Start Ollama with: ollama serve",
            ),
        }
    }

    /// Check 2: chat model installed
    async fn check_chat_model(&self) -> HealthCheck {
        self.check_model("Chat model", &self.config.models.chat).await
    }

    /// Check 3: analysis model installed
    async fn check_analysis_model(&self) -> HealthCheck {
        self.check_model("Analysis model", self.config.analysis_model())
            .await
    }

    async fn check_model(&self, name: &str, tag: &str) -> HealthCheck {
        let client = match OllamaClient::new(&self.config.ollama.base_url(), tag) {
            Ok(client) => client,
            Err(e) => {
                return HealthCheck::fail(name, format!("Could not build client: {e}"), "")
            }
        };

        match client.has_model(tag).await {
            Ok(true) => HealthCheck::pass(name),
            Ok(false) => HealthCheck::fail(
                name,
                format!("'{tag}' is not installed"),
                &format!("Install it with: ollama pull {tag}"),
            ),
            Err(e) => HealthCheck::fail(name, format!("Could not list models: {e}"), ""),
        }
    }

    /// Check 4: Qdrant reachable
    async fn check_qdrant(&self) -> HealthCheck {
        let store = match VectorStore::new(&self.config.qdrant.url, &self.config.qdrant.collection)
        {
            Ok(store) => store,
            Err(e) => {
                return HealthCheck::fail(
                    "Qdrant",
                    format!("Could not build client: {e:#}"),
                    "Check the [qdrant] url setting",
                )
            }
        };

        // count() fails both when the service is down and when the
        // collection does not exist yet; only the former is fatal.
        match tokio::time::timeout(Duration::from_secs(5), store.count()).await {
            Ok(Ok(_)) => HealthCheck::pass("Qdrant"),
            Ok(Err(e)) => {
                let message = format!("{e:#}");
                if message.contains("doesn't exist") || message.contains("Not found") {
                    HealthCheck::warn(
                        "Qdrant",
                        format!("Collection '{}' not indexed yet", self.config.qdrant.collection),
                        "Run: codebuddy index <PATH>",
                    )
                } else {
                    HealthCheck::fail(
                        "Qdrant",
                        format!("Not reachable at {}", self.config.qdrant.url),
                        "Start Qdrant, e.g.: docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant",
                    )
                }
            }
            Err(_) => HealthCheck::fail(
                "Qdrant",
                format!("Timed out connecting to {}", self.config.qdrant.url),
                "Start Qdrant, e.g.: docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant",
            ),
        }
    }

    /// Check 5: embedding model cached locally
    fn check_embedding_cache(&self) -> HealthCheck {
        let cached = dirs::home_dir()
            .map(|home| {
                home.join(".cache/huggingface/hub")
                    .join(format!(
                        "models--{}",
                        self.config.embedding.model_id.replace('/', "--")
                    ))
                    .exists()
            })
            .unwrap_or(false);

        if cached {
            HealthCheck::pass("Embedding model cache")
        } else {
            HealthCheck::warn(
                "Embedding model cache",
                format!("'{}' not downloaded yet", self.config.embedding.model_id),
                "It will be downloaded on first index run",
            )
        }
    }
}
