//! Code analysis pipeline
//!
//! Drives the four phases over the corpus:
//!
//! 1. load & preprocess documents
//! 2. create embeddings & vector store
//! 3. initialise the QA chain & analysis agent
//! 4. process user queries
//!
//! Each phase is an explicit method; starting a phase before its inputs
//! exist is an `InvalidTransition` error rather than a panic later.

use crate::agent::{AnalysisAgent, AnalysisReport};
use crate::config::Config;
use crate::embedding::EmbeddingEngine;
use crate::errors::{PipelineError, Result};
use crate::llm::OllamaClient;
use crate::loader::{DocumentLoader, LoadFailure, LoaderConfig};
use crate::qa::{QaChain, QaResponse, RetrievalParams, Retriever};
use crate::splitter::{Chunk, TextSplitter};
use crate::store::VectorStore;
use crate::telemetry::{PipelineTelemetry, TelemetryEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Chunks embedded per forward pass
const EMBED_BATCH_SIZE: usize = 32;

/// Sampling temperature for the QA chat model
const QA_TEMPERATURE: f32 = 0.5;

/// Summary of the load & preprocess phase
#[derive(Debug)]
pub struct LoadReport {
    pub documents_loaded: usize,
    pub chunks_created: usize,
    pub failures: Vec<LoadFailure>,
    pub documents_saved: usize,
}

/// Summary of the embed & store phase
#[derive(Debug)]
pub struct IndexReport {
    pub chunks_indexed: usize,
    pub dimension: usize,
    pub collection: String,
}

/// Per-query options
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Run the analysis agent over each retrieved document as well
    pub analyze_documents: bool,
    /// Expand the QA answer with the elaboration prompt
    pub elaborate: bool,
}

/// Analysis of a single retrieved document
#[derive(Debug)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub report: AnalysisReport,
}

/// Everything produced for one query
#[derive(Debug)]
pub struct QueryOutcome {
    pub qa: QaResponse,
    pub elaboration: Option<String>,
    pub report: AnalysisReport,
    pub document_reports: Vec<DocumentReport>,
}

/// Four-phase retrieval-augmented code analysis pipeline
pub struct CodeAnalysisPipeline {
    config: Config,
    telemetry: PipelineTelemetry,
    chunks: Option<Vec<Chunk>>,
    engine: Option<Arc<EmbeddingEngine>>,
    store: Option<Arc<VectorStore>>,
    qa_chain: Option<QaChain>,
    agent: Option<AnalysisAgent>,
}

impl CodeAnalysisPipeline {
    /// Create a pipeline over a configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            telemetry: PipelineTelemetry::new(),
            chunks: None,
            engine: None,
            store: None,
            qa_chain: None,
            agent: None,
        }
    }

    /// Telemetry collector shared with the caller for display
    pub fn telemetry(&self) -> &PipelineTelemetry {
        &self.telemetry
    }

    /// Phase 1: load documents under `root` and split them into chunks
    pub async fn load_and_preprocess(&mut self, root: &Path) -> Result<LoadReport> {
        let start = Instant::now();

        let loader_config = LoaderConfig::new(root, self.config.corpus.extensions.clone());
        let loader = DocumentLoader::new(loader_config)?;
        let outcome = loader.load_documents().await?;

        if outcome.documents.is_empty() {
            return Err(PipelineError::EmptyCorpus {
                root: root.to_path_buf(),
            });
        }

        let documents_saved = match &self.config.corpus.docs_dir {
            Some(docs_dir) => loader.save_documents(&outcome.documents, docs_dir)?,
            None => 0,
        };

        let splitter = TextSplitter::new(
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        )?;
        let chunks = splitter.split_documents(&outcome.documents)?;

        let report = LoadReport {
            documents_loaded: outcome.documents.len(),
            chunks_created: chunks.len(),
            failures: outcome.failures,
            documents_saved,
        };

        self.chunks = Some(chunks);
        self.telemetry.phase_completed(
            "load and preprocess documents",
            start.elapsed(),
            report.chunks_created,
        );

        Ok(report)
    }

    /// Phase 2: embed all chunks and upsert them into the vector store
    ///
    /// `rebuild` drops any existing collection first. `on_batch` is
    /// invoked after every stored batch with (chunks done, total).
    pub async fn create_embeddings_and_store<F>(
        &mut self,
        rebuild: bool,
        mut on_batch: F,
    ) -> Result<IndexReport>
    where
        F: FnMut(usize, usize),
    {
        let chunks = self.chunks.take().ok_or_else(|| phase_error(
            "create embeddings and vector store",
            "documents have not been loaded yet",
        ))?;
        let start = Instant::now();

        let engine = self.load_engine().await?;
        let store = self.connect_store()?;

        if rebuild {
            store
                .clear_collection(engine.dimension())
                .await
                .map_err(|e| PipelineError::VectorStoreError(format!("{e:#}")))?;
        } else {
            store
                .ensure_collection(engine.dimension())
                .await
                .map_err(|e| PipelineError::VectorStoreError(format!("{e:#}")))?;
        }

        let total = chunks.len();
        let mut done = 0;

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let engine_ref = Arc::clone(&engine);

            let embeddings = tokio::task::spawn_blocking(move || {
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                engine_ref.embed_batch(&refs)
            })
            .await
            .map_err(|e| PipelineError::Generic(format!("Embedding worker panicked: {e}")))?
            .map_err(|e| PipelineError::EmbeddingError(format!("{e:#}")))?;

            store
                .add_chunks(batch, &embeddings)
                .await
                .map_err(|e| PipelineError::VectorStoreError(format!("{e:#}")))?;

            done += batch.len();
            on_batch(done, total);
        }

        self.telemetry
            .phase_completed("create embeddings and vector store", start.elapsed(), total);

        Ok(IndexReport {
            chunks_indexed: total,
            dimension: engine.dimension(),
            collection: store.collection().to_string(),
        })
    }

    /// Connect to an index built by a previous run instead of phases 1-2
    ///
    /// Returns the number of chunks already stored.
    pub async fn open_index(&mut self) -> Result<u64> {
        let _engine = self.load_engine().await?;
        let store = self.connect_store()?;

        let count = store.count().await.map_err(|e| {
            PipelineError::VectorStoreError(format!(
                "No usable index in collection '{}' ({e:#}); run `codebuddy index` first",
                store.collection()
            ))
        })?;

        Ok(count)
    }

    /// Phase 3: initialise the QA chain and the analysis agent
    pub fn initialize_chains(&mut self) -> Result<()> {
        let engine = self.engine.clone().ok_or_else(|| phase_error(
            "initialize QA chain and agent",
            "embeddings have not been created yet",
        ))?;
        let store = self.store.clone().ok_or_else(|| phase_error(
            "initialize QA chain and agent",
            "the vector store has not been initialised yet",
        ))?;

        let chat_model = OllamaClient::new(
            &self.config.ollama.base_url(),
            &self.config.models.chat,
        )?
        .with_temperature(QA_TEMPERATURE);

        let retriever = Retriever::new(
            engine,
            store,
            RetrievalParams::from(self.config.retrieval),
        );
        self.qa_chain = Some(QaChain::new(Arc::new(chat_model), retriever));

        let analysis_model = OllamaClient::new(
            &self.config.ollama.base_url(),
            self.config.analysis_model(),
        )?;
        self.agent = Some(AnalysisAgent::new(Arc::new(analysis_model)));

        Ok(())
    }

    /// QA chain, once phase 3 has run
    pub fn qa_chain(&self) -> Option<&QaChain> {
        self.qa_chain.as_ref()
    }

    /// Phase 4: answer a query, then run the agent over the answer and
    /// (optionally) over each retrieved document
    pub async fn process_query(&self, query: &str, options: QueryOptions) -> Result<QueryOutcome> {
        let qa_chain = self.qa_chain.as_ref().ok_or_else(|| phase_error(
            "process user query",
            "the QA chain has not been initialised yet",
        ))?;
        let agent = self.agent.as_ref().ok_or_else(|| phase_error(
            "process user query",
            "the analysis agent has not been initialised yet",
        ))?;
        let start = Instant::now();

        let qa = qa_chain.ask(query).await?;

        let elaboration = if options.elaborate {
            Some(qa_chain.elaborate(&qa.answer).await?)
        } else {
            None
        };

        let report = agent.run(&qa.answer).await?;

        let mut document_reports = Vec::new();
        if options.analyze_documents {
            for scored in &qa.sources {
                let doc_report = agent.run(&scored.chunk.content).await?;
                document_reports.push(DocumentReport {
                    source: scored.chunk.source.clone(),
                    report: doc_report,
                });
            }
        }

        self.telemetry.record(TelemetryEvent::QueryProcessed {
            duration: start.elapsed(),
        });

        Ok(QueryOutcome {
            qa,
            elaboration,
            report,
            document_reports,
        })
    }

    /// Load the embedding engine once and share it
    async fn load_engine(&mut self) -> Result<Arc<EmbeddingEngine>> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }

        let model_id = self.config.embedding.model_id.clone();
        let engine = tokio::task::spawn_blocking(move || EmbeddingEngine::with_model(&model_id))
            .await
            .map_err(|e| PipelineError::Generic(format!("Embedding loader panicked: {e}")))?
            .map_err(|e| PipelineError::EmbeddingError(format!("{e:#}")))?;

        let engine = Arc::new(engine);
        self.engine = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Connect to Qdrant once and share the handle
    fn connect_store(&mut self) -> Result<Arc<VectorStore>> {
        if let Some(store) = &self.store {
            return Ok(Arc::clone(store));
        }

        let store = VectorStore::new(&self.config.qdrant.url, &self.config.qdrant.collection)
            .map_err(|e| PipelineError::VectorStoreError(format!("{e:#}")))?;

        let store = Arc::new(store);
        self.store = Some(Arc::clone(&store));
        Ok(store)
    }
}

fn phase_error(phase: &str, reason: &str) -> PipelineError {
    PipelineError::InvalidTransition {
        from: "Init".to_string(),
        to: phase.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_phase_with_temp_corpus() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n".repeat(40)).unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    return 1\n").unwrap();

        let mut pipeline = CodeAnalysisPipeline::new(Config::default());
        let report = pipeline.load_and_preprocess(dir.path()).await.unwrap();

        assert_eq!(report.documents_loaded, 2);
        assert!(report.chunks_created >= 2);
        assert!(report.failures.is_empty());
        assert_eq!(pipeline.telemetry().stats().phases_completed, 1);
    }

    #[tokio::test]
    async fn test_load_phase_empty_corpus_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("image.bin"), [0u8; 4]).unwrap();

        let mut pipeline = CodeAnalysisPipeline::new(Config::default());
        let result = pipeline.load_and_preprocess(dir.path()).await;

        assert!(matches!(result, Err(PipelineError::EmptyCorpus { .. })));
    }

    #[tokio::test]
    async fn test_embed_phase_requires_loaded_documents() {
        let mut pipeline = CodeAnalysisPipeline::new(Config::default());
        let result = pipeline
            .create_embeddings_and_store(false, |_, _| {})
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_initialize_chains_requires_embeddings() {
        let mut pipeline = CodeAnalysisPipeline::new(Config::default());
        let result = pipeline.initialize_chains();

        assert!(matches!(
            result,
            Err(PipelineError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_requires_initialized_chains() {
        let pipeline = CodeAnalysisPipeline::new(Config::default());
        let result = pipeline
            .process_query("what is this?", QueryOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_saves_documents_when_configured() {
        let corpus = TempDir::new().unwrap();
        std::fs::write(corpus.path().join("lib.rs"), "pub fn lib() {}").unwrap();
        let docs_out = TempDir::new().unwrap();

        let mut config = Config::default();
        config.corpus.docs_dir = Some(docs_out.path().to_path_buf());

        let mut pipeline = CodeAnalysisPipeline::new(config);
        let report = pipeline.load_and_preprocess(corpus.path()).await.unwrap();

        assert_eq!(report.documents_saved, 1);
        assert!(docs_out.path().join("lib.txt").exists());
    }
}
