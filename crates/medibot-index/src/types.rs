//! Record and manifest types stored in an index directory.

use crate::distance::DistanceMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk format version written to `manifest.json`.
pub const FORMAT_VERSION: u32 = 1;

/// One embedded chunk of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier of the chunk inside the index.
    pub id: String,
    /// The chunk text.
    pub content: String,
    /// Where the chunk came from (usually a file path).
    pub source: String,
    /// Page of the source document, when the source has pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Embedding of `content`.
    pub vector: Vec<f32>,
}

/// Describes how an index was built.
///
/// The embedder name and dimensions must match the embedder used at query
/// time, otherwise similarity scores are meaningless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version.
    pub format_version: u32,
    /// Name of the embedder that produced the vectors.
    pub embedder: String,
    /// Dimensionality of every vector in the index.
    pub dimensions: usize,
    /// Metric used to rank results.
    pub metric: DistanceMetric,
    /// Number of records in `chunks.jsonl`.
    pub record_count: usize,
    /// When the index was written.
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    pub(crate) fn new(embedder: String, dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            embedder,
            dimensions,
            metric,
            record_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// A scored match returned by [`VectorIndex::search`](crate::VectorIndex::search).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the record in insertion order.
    pub position: usize,
    /// Similarity score (higher is more similar).
    pub score: f32,
}
