//! Vector store backed by a `medibot-index` directory
//!
//! The index directory is produced by `medibot ingest`. Opening checks that
//! it was built by the embedder configured now; vectors from a different
//! embedder would rank chunks meaninglessly.

use super::vectorstore::{StoreOpener, VectorStore};
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, DocumentChunk, Result};
use async_trait::async_trait;
use medibot_index::VectorIndex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Opens the persisted index at a fixed path.
pub struct PersistedStoreOpener {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl PersistedStoreOpener {
    pub fn new(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path: path.into(),
            embedder,
        }
    }
}

#[async_trait]
impl StoreOpener for PersistedStoreOpener {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn open(&self) -> Result<Arc<dyn VectorStore>> {
        let index = VectorIndex::open(&self.path).await.map_err(|e| match e {
            medibot_index::Error::NotFound(path) => AppError::StoreUnavailable(format!(
                "No vector index at {} (run `medibot ingest` first)",
                path.display()
            )),
            other => AppError::StoreUnavailable(format!(
                "Failed to open vector index at {}: {}",
                self.path.display(),
                other
            )),
        })?;

        let manifest = index.manifest();
        if manifest.embedder != self.embedder.name()
            || manifest.dimensions != self.embedder.dimensions()
        {
            return Err(AppError::StoreUnavailable(format!(
                "Index was built with embedder '{}' ({} dimensions) but '{}' ({} dimensions) is configured",
                manifest.embedder,
                manifest.dimensions,
                self.embedder.name(),
                self.embedder.dimensions()
            )));
        }

        Ok(Arc::new(PersistedVectorStore::new(
            index,
            Arc::clone(&self.embedder),
        )))
    }
}

/// A loaded index plus the embedder for queries.
pub struct PersistedVectorStore {
    index: VectorIndex,
    chunks: Vec<Arc<DocumentChunk>>,
    embedder: Arc<dyn Embedder>,
}

impl PersistedVectorStore {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>) -> Self {
        let chunks = index
            .records()
            .iter()
            .map(|record| {
                Arc::new(DocumentChunk {
                    id: record.id.clone(),
                    content: record.content.clone(),
                    source: record.source.clone(),
                    page: record.page,
                })
            })
            .collect();

        Self {
            index,
            chunks,
            embedder,
        }
    }
}

#[async_trait]
impl VectorStore for PersistedVectorStore {
    fn provider_name(&self) -> &'static str {
        "medibot-index"
    }

    #[instrument(skip(self, query))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Arc<DocumentChunk>>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_one(query).await?;

        let hits = self
            .index
            .search(&vector, k)
            .map_err(|e| AppError::Retrieval(format!("Index search failed: {}", e)))?;

        debug!(hits = hits.len(), "Retrieved chunks");

        Ok(hits
            .iter()
            .filter_map(|hit| self.chunks.get(hit.position).cloned())
            .collect())
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::HashEmbedder;
    use medibot_index::{ChunkRecord, DistanceMetric};

    async fn build_index(dir: &std::path::Path, embedder: &HashEmbedder, texts: &[&str]) {
        let mut index = VectorIndex::new(
            embedder.name(),
            embedder.dimensions(),
            DistanceMetric::Cosine,
        );
        for (i, text) in texts.iter().enumerate() {
            index
                .insert(ChunkRecord {
                    id: format!("doc.txt:{}", i),
                    content: text.to_string(),
                    source: "doc.txt".to_string(),
                    page: Some(i as u32 + 1),
                    vector: embedder.embed_one(text).await.unwrap(),
                })
                .unwrap();
        }
        index.save(dir, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db_index");
        let embedder = HashEmbedder::new(512);
        build_index(
            &path,
            &embedder,
            &["Aspirin reduces fever.", "Insulin regulates blood sugar."],
        )
        .await;

        let opener = PersistedStoreOpener::new(&path, Arc::new(embedder));
        let store = opener.open().await.unwrap();
        assert_eq!(store.chunk_count(), 2);

        let hits = store.search("aspirin fever", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Aspirin reduces fever.");
        assert_eq!(hits[0].page, Some(1));
    }

    #[tokio::test]
    async fn test_missing_path_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let opener =
            PersistedStoreOpener::new(dir.path().join("absent"), Arc::new(HashEmbedder::new(8)));
        let err = opener.open().await.err().unwrap();
        assert_eq!(err.kind(), "store_unavailable");
        assert!(err.to_string().contains("medibot ingest"));
    }

    #[tokio::test]
    async fn test_embedder_mismatch_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db_index");
        build_index(&path, &HashEmbedder::new(64), &["text"]).await;

        let opener = PersistedStoreOpener::new(&path, Arc::new(HashEmbedder::new(128)));
        let err = opener.open().await.err().unwrap();
        assert_eq!(err.kind(), "store_unavailable");
        assert!(err.to_string().contains("hash-64"));
    }
}
