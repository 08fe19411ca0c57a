//! Similarity metrics used to rank chunk vectors against a query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metric used to score a stored vector against a query vector.
///
/// Every metric is expressed so that a **higher score means more similar**,
/// which lets the index sort all of them the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity. Range: [-1, 1].
    ///
    /// Best for sentence embeddings, which is what the index stores.
    #[default]
    Cosine,

    /// Dot product. Equivalent to cosine for unit-length vectors.
    DotProduct,

    /// Euclidean (L2) distance mapped to `1 / (1 + dist)`, in (0, 1].
    Euclidean,
}

impl DistanceMetric {
    /// Compute the similarity score between two vectors of equal length.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::DotProduct => dot_product(a, b),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }

    /// Get the name of this metric as stored in the manifest.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "dot" | "dot_product" | "dotproduct" => Ok(DistanceMetric::DotProduct),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

/// Dot product of two vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity of two vectors. Zero-length vectors score 0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Euclidean distance between two vectors.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
