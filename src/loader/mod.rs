//! Document loader
//!
//! Enumerates files under a corpus root, dispatches each file to the
//! parser for its extension, and fans the parsing out across a bounded
//! pool of blocking tasks. A file that fails to parse is recorded and
//! skipped; it never aborts the batch.

pub mod parsers;

pub use parsers::DocumentFormat;

use crate::errors::{PipelineError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use uuid::Uuid;
use walkdir::WalkDir;

/// Configuration for document loading
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Corpus root directory
    pub root_dir: PathBuf,
    /// Accepted file extensions, with leading dot (e.g. `.rs`)
    pub extensions: Vec<String>,
    /// Recurse into subdirectories
    pub recursive: bool,
    /// Skip hidden files and directories
    pub ignore_hidden: bool,
    /// Maximum number of files parsed concurrently
    pub max_workers: usize,
}

impl LoaderConfig {
    /// Create a loader config for a corpus root with default settings
    pub fn new(root_dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            extensions,
            recursive: true,
            ignore_hidden: true,
            max_workers: num_cpus::get().max(1),
        }
    }

    /// Validate that the corpus root exists and is a directory
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.is_dir() {
            return Err(PipelineError::ConfigError(format!(
                "Invalid corpus directory: {}",
                self.root_dir.display()
            )));
        }
        Ok(())
    }
}

/// A loaded, preprocessed document
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub source: PathBuf,
    pub content: String,
    pub format: DocumentFormat,
    pub loaded_at: DateTime<Utc>,
}

/// A file that could not be parsed
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one loading pass
#[derive(Debug)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
    pub files_scanned: usize,
    pub elapsed: Duration,
}

/// Multi-threaded document loader
pub struct DocumentLoader {
    config: LoaderConfig,
}

impl DocumentLoader {
    /// Create a loader, validating the corpus root
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Enumerate candidate files under the corpus root
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.config.root_dir)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| {
                // Never filter out the root itself
                entry.depth() == 0 || !self.config.ignore_hidden || !is_hidden(entry.path())
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.matches_extension(path))
            .collect()
    }

    /// Load all matching documents under the corpus root
    pub async fn load_documents(&self) -> Result<LoadOutcome> {
        self.load_documents_filtered(|_| true).await
    }

    /// Load documents, keeping only files accepted by `filter`
    pub async fn load_documents_filtered<F>(&self, filter: F) -> Result<LoadOutcome>
    where
        F: Fn(&Path) -> bool,
    {
        let start = Instant::now();
        let files: Vec<PathBuf> = self
            .discover_files()
            .into_iter()
            .filter(|path| filter(path))
            .collect();
        let files_scanned = files.len();

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                let parse_path = path.clone();
                let parsed =
                    tokio::task::spawn_blocking(move || parsers::parse_file(&parse_path)).await;

                match parsed {
                    Ok(Ok(content)) => Ok(Document {
                        id: Uuid::new_v4(),
                        format: DocumentFormat::from_path(&path),
                        source: path,
                        content,
                        loaded_at: Utc::now(),
                    }),
                    Ok(Err(err)) => Err(LoadFailure {
                        path,
                        reason: format!("{err:#}"),
                    }),
                    Err(err) => Err(LoadFailure {
                        path,
                        reason: format!("parser task failed: {err}"),
                    }),
                }
            }));
        }

        let mut documents = Vec::new();
        let mut failures = Vec::new();

        for handle in handles {
            match handle.await {
                Ok(Ok(document)) => documents.push(document),
                Ok(Err(failure)) => failures.push(failure),
                Err(err) => {
                    return Err(PipelineError::Generic(format!(
                        "Loader worker panicked: {err}"
                    )))
                }
            }
        }

        // Deterministic order regardless of task completion order
        documents.sort_by(|a, b| a.source.cmp(&b.source));

        Ok(LoadOutcome {
            documents,
            failures,
            files_scanned,
            elapsed: start.elapsed(),
        })
    }

    /// Save preprocessed document text into `docs_dir`, one `.txt` per source
    pub fn save_documents(&self, documents: &[Document], docs_dir: &Path) -> Result<usize> {
        std::fs::create_dir_all(docs_dir)?;

        let mut written = 0;
        for document in documents {
            let stem = document
                .source
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");

            let mut target = docs_dir.join(format!("{stem}.txt"));
            let mut suffix = 1;
            while target.exists() {
                target = docs_dir.join(format!("{stem}-{suffix}.txt"));
                suffix += 1;
            }

            std::fs::write(&target, &document.content)?;
            written += 1;
        }

        Ok(written)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", ext.to_ascii_lowercase());
        self.config
            .extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(&dotted))
    }
}

/// A path is hidden when its final component starts with a dot
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
