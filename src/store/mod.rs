//! Vector store - Qdrant-backed chunk index
//!
//! Wraps the Qdrant client with the three operations the pipeline needs:
//! idempotent collection creation, batch chunk upsert, and top-k cosine
//! search. Persistence is handled by the Qdrant service, so an index
//! built once outlives the process.

use anyhow::{Context, Result};
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointStruct, SearchPoints, Value as QdrantValue, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::splitter::Chunk;

/// A chunk returned from similarity search, with its cosine score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Qdrant-backed vector store
pub struct VectorStore {
    client: QdrantClient,
    collection: String,
}

impl VectorStore {
    /// Connect to a Qdrant instance
    pub fn new(url: &str, collection: &str) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    /// Collection name this store writes to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection if it does not exist yet
    pub async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("Failed to list collections")?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: dimension as u64,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
        }

        Ok(())
    }

    /// Drop and recreate the collection (re-indexing)
    pub async fn clear_collection(&self, dimension: usize) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("Failed to list collections")?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if exists {
            self.client
                .delete_collection(&self.collection)
                .await
                .context(format!("Failed to delete collection: {}", self.collection))?;
        }

        self.ensure_collection(dimension).await
    }

    /// Upsert chunks with their embeddings
    ///
    /// `chunks` and `embeddings` must be the same length and non-empty.
    pub async fn add_chunks(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.is_empty() {
            anyhow::bail!("No chunks to store");
        }
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Chunk/embedding count mismatch: {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            );
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                let mut payload = HashMap::new();
                payload.insert(
                    "content".to_string(),
                    QdrantValue::from(chunk.content.clone()),
                );
                payload.insert(
                    "source".to_string(),
                    QdrantValue::from(chunk.source.display().to_string()),
                );
                payload.insert(
                    "chunk_index".to_string(),
                    QdrantValue::from(chunk.chunk_index as i64),
                );

                PointStruct::new(chunk.id.to_string(), embedding.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert chunks")?;

        Ok(())
    }

    /// Search the collection for the `top_k` nearest chunks
    ///
    /// A positive `score_threshold` filters out low-similarity hits.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let threshold = (score_threshold > 0.0).then_some(score_threshold);

        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: query_embedding.to_vec(),
                limit: top_k as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                score_threshold: threshold,
                ..Default::default()
            })
            .await
            .context("Failed to search chunks")?;

        let results = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                let content = payload
                    .get("content")
                    .and_then(value_as_string)
                    .unwrap_or_default();
                let source = payload
                    .get("source")
                    .and_then(value_as_string)
                    .map(PathBuf::from)
                    .unwrap_or_default();
                let chunk_index = payload
                    .get("chunk_index")
                    .and_then(value_as_integer)
                    .unwrap_or(0) as usize;

                let id = point_id_to_uuid(&point.id);

                ScoredChunk {
                    chunk: Chunk {
                        id,
                        source,
                        chunk_index,
                        content,
                    },
                    score: point.score,
                }
            })
            .collect();

        Ok(results)
    }

    /// Number of chunks stored in the collection
    pub async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

fn value_as_string(value: &QdrantValue) -> Option<String> {
    use qdrant_client::qdrant::value::Kind;
    match value.kind.as_ref() {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn value_as_integer(value: &QdrantValue) -> Option<i64> {
    use qdrant_client::qdrant::value::Kind;
    match value.kind.as_ref() {
        Some(Kind::IntegerValue(i)) => Some(*i),
        _ => None,
    }
}

fn point_id_to_uuid(point_id: &Option<qdrant_client::qdrant::PointId>) -> Uuid {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    point_id
        .as_ref()
        .and_then(|id| match &id.point_id_options {
            Some(PointIdOptions::Uuid(u)) => Uuid::parse_str(u).ok(),
            _ => None,
        })
        .unwrap_or_else(Uuid::nil)
}
