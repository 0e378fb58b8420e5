//! Catalog Graph
//!
//! Semantic search over a catalog's logical data model. Datasets, facts and
//! attributes are loaded into a property graph, each entity is embedded from
//! its title and description, and a cosine vector index answers
//! nearest-neighbour queries.
//!
//! # Components
//!
//! - [`embed`]: the embedding model behind [`EmbeddingProvider`]
//! - [`store`]: the [`GraphStore`] facade and its embedded implementation
//! - [`ingest`]: [`IngestionPipeline`], source tree to graph
//! - [`search`]: [`SearchService`], all / by kind / by containing dataset
//! - [`teardown`]: [`TeardownTool`], back to an empty store
//!
//! The facade sits on [`graph`] (labels, typed edges, uniqueness
//! constraints), [`vector`] (HNSW indexes) and [`persistence`] (snapshots).
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_graph::{
//!     EmbeddedGraphStore, EntityKind, HashingEmbedder, IngestionPipeline, LogicalModel,
//!     SearchService, SourceDataset, SourceField,
//! };
//!
//! let model = LogicalModel {
//!     datasets: vec![SourceDataset {
//!         id: "d1".into(),
//!         title: "Revenue".into(),
//!         description: "Total revenue".into(),
//!         facts: vec![SourceField {
//!             id: "f1".into(),
//!             title: "Revenue Amount".into(),
//!             description: "Amount of revenue".into(),
//!             ..SourceField::default()
//!         }],
//!         ..SourceDataset::default()
//!     }],
//! };
//!
//! let store = EmbeddedGraphStore::in_memory();
//! let embedder = HashingEmbedder::new(768);
//! IngestionPipeline::new(&store, &embedder).run(&model).unwrap();
//!
//! let hits = SearchService::new(&store, &embedder).search_all("revenue", 1).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].kind, EntityKind::Dataset);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod embed;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod model;
pub mod persistence;
pub mod search;
pub mod source;
pub mod store;
pub mod teardown;
pub mod vector;

// Re-export main types for convenience
pub use config::{CatalogConfig, Config, EmbedBackend, EmbedConfig, SearchConfig, StoreConfig};
pub use embed::{
    embed_entity, embedding_text, fixed::FixedEmbeddings, hashing::HashingEmbedder,
    provider_from_config, EmbedError, EmbedResult, EmbeddingProvider,
};
pub use error::{CatalogError, CatalogResult, IngestStage};
pub use ingest::{IngestReport, IngestionPipeline};
pub use model::{
    Describe, Entity, EntityKind, LogicalModel, RelationshipKind, SourceDataset, SourceField,
    SourceReference, EMBEDDED_LABEL,
};
pub use search::{ContainerHit, SearchHit, SearchService};
pub use source::{CatalogSource, FileSource, HttpCatalogSource};
pub use store::{
    EmbeddedGraphStore, GraphStore, ScoredNode, StoreError, StoreResult, StoreSession,
    StoreStats, StoredEntity,
};
pub use teardown::{TeardownReport, TeardownTool};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.1.0");
    }
}
