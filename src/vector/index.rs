//! Vector index implementation using HNSW
//!
//! Wraps `hnsw_rs` for approximate nearest neighbor search. The raw vectors
//! are kept next to the HNSW graph so candidates can be re-scored exactly
//! and so the graph can be rebuilt when a node's vector is overwritten
//! (HNSW does not support in-place updates).

use crate::graph::NodeId;
use hnsw_rs::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vector index errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("Index error: {0}")]
    IndexError(String),

    #[error("Vector index `{0}` already exists")]
    AlreadyExists(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Indexes at or below this size are searched by exact scan.
pub const EXACT_SEARCH_LIMIT: usize = 256;

const MAX_CONNECTIONS: usize = 16;
const MAX_LAYERS: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const MIN_EF_SEARCH: usize = 64;
const INITIAL_CAPACITY: usize = 10_000;

/// Similarity function of a vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine similarity, score in [-1, 1]
    #[default]
    Cosine,
}

impl DistanceMetric {
    /// Similarity score between two vectors; higher is closer.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let mut dot = 0.0;
                let mut norm_a = 0.0;
                let mut norm_b = 0.0;
                for (x, y) in a.iter().zip(b.iter()) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                if norm_a <= 0.0 || norm_b <= 0.0 {
                    return 0.0;
                }
                (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
            }
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => f.write_str("cosine"),
        }
    }
}

/// Distance adapter handed to `hnsw_rs`
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricDistance {
    metric: DistanceMetric,
}

impl Distance<f32> for MetricDistance {
    fn eval(&self, va: &[f32], vb: &[f32]) -> f32 {
        1.0 - self.metric.similarity(va, vb)
    }
}

/// HNSW index over node vectors
pub struct VectorIndex {
    dimensions: usize,
    metric: DistanceMetric,
    points: IndexMap<NodeId, Vec<f32>>,
    hnsw: Hnsw<'static, f32, MetricDistance>,
}

// Hnsw doesn't implement Debug
impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("dimensions", &self.dimensions)
            .field("metric", &self.metric)
            .field("len", &self.points.len())
            .finish()
    }
}

impl VectorIndex {
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            dimensions,
            metric,
            points: IndexMap::new(),
            hnsw: Self::empty_hnsw(metric, INITIAL_CAPACITY),
        }
    }

    fn empty_hnsw(metric: DistanceMetric, capacity: usize) -> Hnsw<'static, f32, MetricDistance> {
        Hnsw::new(
            MAX_CONNECTIONS,
            capacity.max(INITIAL_CAPACITY),
            MAX_LAYERS,
            EF_CONSTRUCTION,
            MetricDistance { metric },
        )
    }

    fn check_dimensions(&self, vector: &[f32]) -> VectorResult<()> {
        if vector.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        Ok(())
    }

    /// Add or replace the vector of a node
    pub fn add(&mut self, node_id: NodeId, vector: &[f32]) -> VectorResult<()> {
        self.check_dimensions(vector)?;

        if self.points.insert(node_id, vector.to_vec()).is_some() {
            self.rebuild();
        } else if let Some(stored) = self.points.get(&node_id) {
            self.hnsw.insert((stored, node_id.as_u64() as usize));
        }
        Ok(())
    }

    /// Remove a node's vector. Returns false if it was not indexed.
    pub fn remove(&mut self, node_id: NodeId) -> bool {
        if self.points.shift_remove(&node_id).is_some() {
            self.rebuild();
            return true;
        }
        false
    }

    fn rebuild(&mut self) {
        let mut hnsw = Self::empty_hnsw(self.metric, self.points.len());
        for (node_id, vector) in &self.points {
            hnsw.insert((vector, node_id.as_u64() as usize));
        }
        self.hnsw = hnsw;
    }

    /// Drop every point, keeping the index definition
    pub fn clear(&mut self) {
        self.points.clear();
        self.hnsw = Self::empty_hnsw(self.metric, INITIAL_CAPACITY);
    }

    /// Search for the `k` most similar nodes.
    ///
    /// Returns `(node, score)` pairs ordered by descending similarity. Scores
    /// are exact similarities of the stored vectors; only candidate
    /// selection is approximate on large indexes.
    pub fn search(&self, query: &[f32], k: usize) -> VectorResult<Vec<(NodeId, f32)>> {
        self.check_dimensions(query)?;
        if k == 0 || self.points.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<NodeId> = if self.points.len() <= EXACT_SEARCH_LIMIT {
            self.points.keys().copied().collect()
        } else {
            let ef_search = (k * 2).max(MIN_EF_SEARCH);
            self.hnsw
                .search(query, k, ef_search)
                .into_iter()
                .map(|neighbour| NodeId::new(neighbour.d_id as u64))
                .collect()
        };

        let mut scored: Vec<(NodeId, f32)> = candidates
            .into_iter()
            .filter_map(|id| {
                self.points
                    .get(&id)
                    .map(|vector| (id, self.metric.similarity(query, vector)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.points.contains_key(&node_id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_index_basic() {
        let mut index = VectorIndex::new(3, DistanceMetric::Cosine);

        index.add(NodeId::new(1), &[1.0, 0.0, 0.0]).unwrap();
        index.add(NodeId::new(2), &[0.0, 1.0, 0.0]).unwrap();
        index.add(NodeId::new(3), &[0.0, 0.1, 0.9]).unwrap();

        let results = index.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, NodeId::new(1));
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_cosine_similarity() {
        let cosine = DistanceMetric::Cosine;
        // Orthogonal
        assert!(cosine.similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        // Same direction, different magnitude
        assert!((cosine.similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
        // Opposite
        assert!((cosine.similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        // Zero vector
        assert_eq!(cosine.similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);

        let distance = MetricDistance { metric: cosine };
        assert!((distance.eval(&[1.0, 0.0], &[1.0, 0.0])).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(3, DistanceMetric::Cosine);
        assert_eq!(
            index.add(NodeId::new(1), &[1.0, 0.0]),
            Err(VectorError::DimensionMismatch { expected: 3, got: 2 })
        );
        assert!(index.search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_overwrite_replaces_point() {
        let mut index = VectorIndex::new(2, DistanceMetric::Cosine);
        index.add(NodeId::new(1), &[1.0, 0.0]).unwrap();
        index.add(NodeId::new(2), &[0.0, 1.0]).unwrap();

        index.add(NodeId::new(1), &[0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].1 < 0.01);
    }

    #[test]
    fn test_empty_index_and_zero_k() {
        let mut index = VectorIndex::new(2, DistanceMetric::Cosine);
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());

        index.add(NodeId::new(1), &[1.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());

        assert!(index.remove(NodeId::new(1)));
        assert!(!index.remove(NodeId::new(1)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_hnsw_path_finds_exact_match() {
        let dims = 16;
        let mut index = VectorIndex::new(dims, DistanceMetric::Cosine);

        // Deterministic pseudo-random vectors (LCG)
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) - 0.25
        };

        let mut target = Vec::new();
        for i in 1..=(EXACT_SEARCH_LIMIT as u64 + 200) {
            let vector: Vec<f32> = (0..dims).map(|_| next()).collect();
            if i == 123 {
                target = vector.clone();
            }
            index.add(NodeId::new(i), &vector).unwrap();
        }

        let results = index.search(&target, 5).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0, NodeId::new(123));
        assert!((results[0].1 - 1.0).abs() < 1e-5);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_hnsw_path_after_rebuild() {
        let dims = 8;
        let mut index = VectorIndex::new(dims, DistanceMetric::Cosine);
        for i in 1..=(EXACT_SEARCH_LIMIT as u64 + 50) {
            let mut vector = vec![0.1f32; dims];
            vector[(i as usize) % dims] = i as f32;
            index.add(NodeId::new(i), &vector).unwrap();
        }

        // Overwriting a point rebuilds the graph from the stored vectors
        let mut moved = vec![0.0f32; dims];
        moved[3] = -1.0;
        moved[5] = 1.0;
        index.add(NodeId::new(7), &moved).unwrap();
        assert_eq!(index.len(), EXACT_SEARCH_LIMIT + 50);

        let results = index.search(&moved, 3).unwrap();
        assert_eq!(results[0].0, NodeId::new(7));
        assert!((results[0].1 - 1.0).abs() < 1e-5);
    }
}
