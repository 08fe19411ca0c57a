//! Text embedders used for indexing and querying
//!
//! The index manifest records which embedder built it; queries must be
//! embedded by the same one. Two implementations are available:
//!
//! - [`HashEmbedder`] - feature hashing over word tokens, deterministic and
//!   dependency free. The default.
//! - `FastEmbedder` - all-MiniLM-L6-v2 sentence embeddings via fastembed
//!   (requires the `local-embeddings` feature).

use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns text into fixed-size vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier stored in the index manifest.
    fn name(&self) -> &str;

    /// Length of every produced vector.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Retrieval("Embedder returned no vector".to_string()))
    }
}

/// Build the embedder selected in the configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Hash => Ok(Arc::new(HashEmbedder::new(config.dimensions))),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Fastembed => Ok(Arc::new(FastEmbedder::new(&config.model)?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Fastembed => Err(AppError::Configuration(
            "store.embedding.provider = \"fastembed\" requires building with the \
             `local-embeddings` feature"
                .to_string(),
        )),
    }
}

// ============= Hash Embedder =============

const FNV_OFFSET: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Bag-of-words feature hashing.
///
/// Each lowercase alphanumeric token adds ±1 to one bucket; the vector is
/// then L2-normalized. Texts sharing words end up close under cosine
/// similarity, which is enough for keyword-style retrieval without a model.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
    name: String,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            name: format!("hash-{}", dimensions),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

// ============= fastembed =============

#[cfg(feature = "local-embeddings")]
pub use self::local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    /// Sentence embeddings computed locally with ONNX Runtime.
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
        name: String,
        dimensions: usize,
    }

    impl FastEmbedder {
        /// Load `model_name`, downloading weights on first use.
        pub fn new(model_name: &str) -> Result<Self> {
            let (model, dimensions) = match model_name
                .trim_start_matches("sentence-transformers/")
                .to_lowercase()
                .as_str()
            {
                "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
                "baai/bge-small-en-v1.5" | "bge-small-en-v1.5" => {
                    (EmbeddingModel::BGESmallENV15, 384)
                }
                other => {
                    return Err(AppError::Configuration(format!(
                        "Unsupported fastembed model '{}'",
                        other
                    )))
                }
            };

            let embedding =
                TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(true))
                    .map_err(|e| {
                        AppError::Configuration(format!("Failed to load embedding model: {}", e))
                    })?;

            Ok(Self {
                model: Arc::new(Mutex::new(embedding)),
                name: format!("fastembed-{}", model_name),
                dimensions,
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        fn name(&self) -> &str {
            &self.name
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();
            tokio::task::spawn_blocking(move || model.lock().embed(texts, None))
                .await
                .map_err(|e| AppError::Internal(format!("Embedding task failed: {}", e)))?
                .map_err(|e| AppError::Retrieval(format!("Embedding failed: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibot_index::distance::cosine_similarity;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["Aspirin reduces fever".to_string()];
        let a = embedder.embed(&texts).await.unwrap();
        let b = embedder.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);

        let norm: f32 = a[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hash_embedder_ranks_shared_words_higher() {
        let embedder = HashEmbedder::new(1024);
        let query = embedder.embed_one("what does aspirin do").await.unwrap();
        let related = embedder
            .embed_one("Aspirin reduces fever and pain.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed_one("Insulin regulates blood sugar.")
            .await
            .unwrap();
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed_one("  ...  ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_create_embedder_from_config() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Hash,
            model: String::new(),
            dimensions: 32,
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "hash-32");
        assert_eq!(embedder.dimensions(), 32);
    }
}
