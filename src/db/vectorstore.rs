//! Vector Store Abstraction Layer
//!
//! ```text
//!  AnswerChain ──▶ StoreAccessor ──(first use)──▶ StoreOpener::open
//!                        │
//!                        └──▶ Arc<dyn VectorStore>::search (shared by all sessions)
//! ```
//!
//! The accessor is built once by the composition root and handed to every
//! chain. Opening is deferred to the first query and happens at most once,
//! even when several sessions ask at the same moment.

use crate::types::{DocumentChunk, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

/// Read-only similarity search over document chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short name of the backend, for logs and health output.
    fn provider_name(&self) -> &'static str;

    /// Return the `k` chunks most similar to `query`, most similar first.
    ///
    /// `k == 0` yields an empty list.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Arc<DocumentChunk>>>;

    /// Number of chunks in the store.
    fn chunk_count(&self) -> usize;
}

/// Opens a vector store. Called by [`StoreAccessor`] at most once per
/// successful initialization.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn VectorStore>>;
}

/// Lazily opened, shared vector store handle.
pub struct StoreAccessor {
    opener: Box<dyn StoreOpener>,
    store: OnceCell<Arc<dyn VectorStore>>,
}

impl StoreAccessor {
    pub fn new(opener: impl StoreOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            store: OnceCell::new(),
        }
    }

    /// Get the shared store, opening it on first use.
    ///
    /// Concurrent first callers wait on a single open. A failed open is
    /// returned to every waiting caller's query and leaves the accessor
    /// uninitialized, so the next query tries again.
    #[instrument(skip(self))]
    pub async fn get_store(&self) -> Result<Arc<dyn VectorStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let store = self.opener.open().await.inspect_err(|e| {
                    warn!(error = %e, "Vector store failed to open");
                })?;
                info!(
                    provider = store.provider_name(),
                    chunks = store.chunk_count(),
                    "Vector store ready"
                );
                Ok::<_, crate::types::AppError>(store)
            })
            .await?;
        Ok(Arc::clone(store))
    }

    /// Whether the store has been opened.
    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    /// The store, if already opened.
    pub fn get_if_initialized(&self) -> Option<Arc<dyn VectorStore>> {
        self.store.get().cloned()
    }
}

/// Chunks held in memory, ranked by the number of words shared with the
/// query. Lets the chain run without an embedded index.
pub struct InMemoryStore {
    chunks: Vec<Arc<DocumentChunk>>,
}

impl InMemoryStore {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Arc::new).collect(),
        }
    }
}

fn words(text: &str) -> std::collections::HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Arc<DocumentChunk>>> {
        let query_words = words(query);
        let mut scored: Vec<(usize, &Arc<DocumentChunk>)> = self
            .chunks
            .iter()
            .map(|chunk| (words(&chunk.content).intersection(&query_words).count(), chunk))
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| Arc::clone(chunk))
            .collect())
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}
