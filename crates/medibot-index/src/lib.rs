//! # medibot-index
//!
//! The persisted embedding index behind MediBot's document retrieval.
//!
//! An index is a directory holding a manifest (which embedder produced the
//! vectors, their dimensionality and the ranking metric) and the embedded
//! chunk records themselves. Search is exact: every record is scored against
//! the query and the top `k` are returned, highest score first. Records with
//! equal scores keep their insertion order, so results are stable for a given
//! index build.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use medibot_index::{ChunkRecord, DistanceMetric, VectorIndex};
//!
//! let mut index = VectorIndex::new("hash-384", 384, DistanceMetric::Cosine);
//! index.insert(ChunkRecord { id: "c1".into(), content: "...".into(),
//!     source: "notes.txt".into(), page: None, vector: embedding })?;
//! index.save("vectorstore/db_index", false).await?;
//!
//! let index = VectorIndex::open("vectorstore/db_index").await?;
//! let hits = index.search(&query_embedding, 3)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod persistence;
pub mod types;

pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use types::{ChunkRecord, IndexManifest, SearchHit};

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

/// An in-memory view of an index directory.
///
/// Built once (by ingestion) or opened from disk; searching only needs `&self`,
/// so a loaded index can be shared freely behind an `Arc`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    records: Vec<ChunkRecord>,
    positions: HashMap<String, usize>,
}

impl VectorIndex {
    /// Create an empty index for vectors produced by `embedder`.
    pub fn new(embedder: impl Into<String>, dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            manifest: IndexManifest::new(embedder.into(), dimensions, metric),
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Open an index previously written with [`VectorIndex::save`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the directory or its manifest is missing,
    /// and [`Error::Persistence`] / [`Error::DimensionMismatch`] if the data
    /// on disk is inconsistent.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let (manifest, records) = persistence::load_index(path.as_ref()).await?;

        let mut positions = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if positions.insert(record.id.clone(), position).is_some() {
                return Err(Error::Persistence(format!(
                    "Duplicate chunk id '{}'",
                    record.id
                )));
            }
        }

        info!(
            embedder = %manifest.embedder,
            dimensions = manifest.dimensions,
            records = records.len(),
            "Opened index"
        );

        Ok(Self {
            manifest,
            records,
            positions,
        })
    }

    /// Write the index to `path`.
    ///
    /// Fails with [`Error::AlreadyExists`] when `path` already holds an index
    /// and `overwrite` is false.
    pub async fn save(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        let manifest_path = path.join(persistence::MANIFEST_FILE);
        if !overwrite && tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
            return Err(Error::AlreadyExists(path.to_path_buf()));
        }

        let mut manifest = self.manifest.clone();
        manifest.record_count = self.records.len();
        manifest.created_at = chrono::Utc::now();
        persistence::save_index(path, &manifest, &self.records).await
    }

    /// Insert a record, replacing any record with the same id in place.
    pub fn insert(&mut self, record: ChunkRecord) -> Result<()> {
        self.validate_vector(&record.vector)?;

        match self.positions.get(&record.id) {
            Some(&position) => self.records[position] = record,
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
        self.manifest.record_count = self.records.len();
        Ok(())
    }

    /// Return the `k` records most similar to `query`, highest score first.
    ///
    /// Ties keep insertion order. `k == 0` yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.validate_vector(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let metric = self.manifest.metric;
        let mut hits: Vec<SearchHit> = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| SearchHit {
                position,
                score: metric.similarity(query, &record.vector),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Record at `position` (as reported by [`SearchHit::position`]).
    pub fn record(&self, position: usize) -> Option<&ChunkRecord> {
        self.records.get(position)
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&ChunkRecord> {
        self.positions.get(id).and_then(|&p| self.records.get(p))
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// The manifest describing this index.
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn validate_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.manifest.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.manifest.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "vector contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            content: id.to_string(),
            source: "test".to_string(),
            page: None,
            vector,
        }
    }

    #[test]
    fn test_search_orders_by_score_descending() {
        let mut index = VectorIndex::new("test", 2, DistanceMetric::Cosine);
        index.insert(record("far", vec![0.0, 1.0])).unwrap();
        index.insert(record("near", vec![1.0, 0.1])).unwrap();
        index.insert(record("mid", vec![1.0, 1.0])).unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = hits
            .iter()
            .map(|h| index.record(h.position).unwrap().id.as_str())
            .collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = VectorIndex::new("test", 2, DistanceMetric::Cosine);
        index.insert(record("first", vec![1.0, 0.0])).unwrap();
        index.insert(record("second", vec![2.0, 0.0])).unwrap();
        index.insert(record("third", vec![3.0, 0.0])).unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn test_zero_k_and_empty_index() {
        let mut index = VectorIndex::new("test", 2, DistanceMetric::Cosine);
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
        index.insert(record("a", vec![1.0, 0.0])).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut index = VectorIndex::new("test", 2, DistanceMetric::Cosine);
        index.insert(record("a", vec![1.0, 0.0])).unwrap();
        index.insert(record("b", vec![0.0, 1.0])).unwrap();
        index.insert(record("a", vec![0.5, 0.5])).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.records()[0].vector, vec![0.5, 0.5]);
        assert_eq!(index.get("b").unwrap().vector, vec![0.0, 1.0]);
    }

    #[test]
    fn test_rejects_bad_vectors() {
        let mut index = VectorIndex::new("test", 3, DistanceMetric::Cosine);
        assert!(matches!(
            index.insert(record("a", vec![1.0, 0.0])),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            index.insert(record("b", vec![f32::NAN, 0.0, 0.0])),
            Err(Error::InvalidVector(_))
        ));
        assert!(index.search(&[1.0], 1).is_err());
    }
}
