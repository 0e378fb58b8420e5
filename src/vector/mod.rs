//! Vector search
//!
//! Named HNSW indexes over vector-valued node properties.

pub mod index;
pub mod manager;

pub use index::{DistanceMetric, VectorError, VectorIndex, VectorResult, EXACT_SEARCH_LIMIT};
pub use manager::{IndexDefinition, VectorIndexManager};
