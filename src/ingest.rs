//! Graph population from the catalog model
//!
//! One sequential run:
//! 1. every dataset, then its facts and attributes, each created, linked
//!    and embedded in source order
//! 2. every reference, once all datasets exist
//! 3. the vector index over all embedded entities
//!
//! The first failure aborts the run. Whatever was written before it stays
//! in the store; teardown is the way back to a clean state.

use crate::config::DEFAULT_INDEX_NAME;
use crate::embed::{embed_entity, EmbeddingProvider};
use crate::error::{CatalogError, CatalogResult, IngestStage};
use crate::model::{Entity, EntityKind, LogicalModel};
use crate::source::CatalogSource;
use crate::store::{GraphStore, StoreSession};
use crate::vector::DistanceMetric;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What a run wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub datasets: usize,
    pub facts: usize,
    pub attributes: usize,
    pub references: usize,
    pub index_name: String,
    /// Vectors picked up by the index
    pub indexed: usize,
}

pub struct IngestionPipeline<'a> {
    store: &'a dyn GraphStore,
    embedder: &'a dyn EmbeddingProvider,
    index_name: String,
    metric: DistanceMetric,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(store: &'a dyn GraphStore, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self {
            store,
            embedder,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            metric: DistanceMetric::Cosine,
        }
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Load the model from `source` and ingest it
    pub fn ingest_source(&self, source: &dyn CatalogSource) -> CatalogResult<IngestReport> {
        info!("Loading catalog model from {}", source.describe());
        let model = source.load()?;
        info!(
            "Model has {} datasets, {} facts, {} attributes, {} references",
            model.datasets.len(),
            model.fact_count(),
            model.attribute_count(),
            model.reference_count()
        );
        self.run(&model)
    }

    /// Ingest a model into an empty store
    pub fn run(&self, model: &LogicalModel) -> CatalogResult<IngestReport> {
        self.store
            .verify_connectivity()
            .map_err(|e| CatalogError::from(e).at(IngestStage::Connect))?;
        let mut session = self
            .store
            .connect()
            .map_err(|e| CatalogError::from(e).at(IngestStage::Connect))?;

        // Checked up front so an existing index fails the run before any write
        if session.vector_index_exists(&self.index_name)? {
            return Err(CatalogError::IndexAlreadyExists(self.index_name.clone())
                .at(IngestStage::VectorIndex(self.index_name.clone())));
        }

        info!(
            "Ingesting {} datasets with {} embeddings",
            model.datasets.len(),
            self.embedder.name()
        );
        let mut report = IngestReport {
            index_name: self.index_name.clone(),
            ..IngestReport::default()
        };

        match self.populate(session.as_mut(), model, &mut report) {
            Ok(()) => {
                session
                    .commit()
                    .map_err(|e| CatalogError::from(e).at(IngestStage::Commit))?;
                info!(
                    "Ingested {} datasets, {} facts, {} attributes, {} references; index {} holds {} vectors",
                    report.datasets,
                    report.facts,
                    report.attributes,
                    report.references,
                    report.index_name,
                    report.indexed
                );
                Ok(report)
            }
            Err(e) => {
                // Keep the store consistent with what was written so teardown sees it
                if let Err(commit_err) = session.commit() {
                    warn!("Could not persist partial ingestion: {}", commit_err);
                }
                Err(e)
            }
        }
    }

    fn populate(
        &self,
        session: &mut dyn StoreSession,
        model: &LogicalModel,
        report: &mut IngestReport,
    ) -> CatalogResult<()> {
        for dataset in &model.datasets {
            info!("Adding dataset {}", dataset.id);
            let stage = IngestStage::Dataset(dataset.id.clone());
            self.add_entity(session, &dataset.entity(), None)
                .map_err(|e| e.at(stage))?;
            report.datasets += 1;

            for fact in &dataset.facts {
                debug!("Adding fact {}", fact.id);
                let stage = IngestStage::Fact {
                    dataset: dataset.id.clone(),
                    fact: fact.id.clone(),
                };
                self.add_entity(session, &fact.entity(EntityKind::Fact), Some(&dataset.id))
                    .map_err(|e| e.at(stage))?;
                report.facts += 1;
            }

            for attribute in &dataset.attributes {
                debug!("Adding attribute {}", attribute.id);
                let stage = IngestStage::Attribute {
                    dataset: dataset.id.clone(),
                    attribute: attribute.id.clone(),
                };
                self.add_entity(
                    session,
                    &attribute.entity(EntityKind::Attribute),
                    Some(&dataset.id),
                )
                .map_err(|e| e.at(stage))?;
                report.attributes += 1;
            }
        }

        for dataset in &model.datasets {
            for reference in &dataset.references {
                let target = reference.target_id();
                info!("Applying reference {} -> {}", dataset.id, target);
                session
                    .link_references(&dataset.id, target)
                    .map_err(|e| {
                        CatalogError::from(e).at(IngestStage::Reference {
                            from: dataset.id.clone(),
                            to: target.to_string(),
                        })
                    })?;
                report.references += 1;
            }
        }

        info!("Creating vector index {}", self.index_name);
        report.indexed = session
            .create_vector_index(&self.index_name, self.embedder.dimensions(), self.metric)
            .map_err(|e| CatalogError::from(e).at(IngestStage::VectorIndex(self.index_name.clone())))?;
        Ok(())
    }

    /// Create the node, link it under its dataset, then attach its embedding
    fn add_entity(
        &self,
        session: &mut dyn StoreSession,
        entity: &Entity,
        parent: Option<&str>,
    ) -> CatalogResult<()> {
        session.create_entity_node(entity)?;
        if let Some(parent_id) = parent {
            session.link_contains(parent_id, entity.kind, &entity.id)?;
        }
        let vector = embed_entity(self.embedder, entity)?;
        session.set_embedding(entity.kind, &entity.id, &vector)?;
        Ok(())
    }

    /// Drop and recreate the vector index over the embeddings already stored
    pub fn rebuild_index(&self) -> CatalogResult<usize> {
        let stage = || IngestStage::VectorIndex(self.index_name.clone());
        self.store
            .verify_connectivity()
            .map_err(|e| CatalogError::from(e).at(IngestStage::Connect))?;
        let mut session = self.store.connect()?;

        if session.drop_vector_index(&self.index_name)? {
            debug!("Dropped vector index {}", self.index_name);
        }
        let indexed = session
            .create_vector_index(&self.index_name, self.embedder.dimensions(), self.metric)
            .map_err(|e| CatalogError::from(e).at(stage()))?;
        session
            .commit()
            .map_err(|e| CatalogError::from(e).at(IngestStage::Commit))?;
        info!("Rebuilt vector index {} with {} vectors", self.index_name, indexed);
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::fixed::FixedEmbeddings;
    use crate::embed::hashing::HashingEmbedder;
    use crate::model::{SourceDataset, SourceField, SourceReference};
    use crate::store::EmbeddedGraphStore;

    fn field(id: &str, title: &str) -> SourceField {
        SourceField {
            id: id.to_string(),
            title: title.to_string(),
            ..SourceField::default()
        }
    }

    fn model() -> LogicalModel {
        LogicalModel {
            datasets: vec![
                SourceDataset {
                    id: "orders".into(),
                    title: "Orders".into(),
                    description: "Customer orders".into(),
                    facts: vec![field("amount", "Amount")],
                    attributes: vec![field("order_date", "Order date")],
                    references: vec![SourceReference::to("customers")],
                },
                SourceDataset {
                    id: "customers".into(),
                    title: "Customers".into(),
                    attributes: vec![field("city", "City")],
                    ..SourceDataset::default()
                },
            ],
        }
    }

    #[test]
    fn test_report_counts() {
        let store = EmbeddedGraphStore::in_memory();
        let embedder = HashingEmbedder::new(32);
        let report = IngestionPipeline::new(&store, &embedder).run(&model()).unwrap();

        assert_eq!(report.datasets, 2);
        assert_eq!(report.facts, 1);
        assert_eq!(report.attributes, 2);
        assert_eq!(report.references, 1);
        assert_eq!(report.indexed, 5);
        assert_eq!(report.index_name, "dataset-embeddings");
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn test_embedding_failure_names_entity() {
        let store = EmbeddedGraphStore::in_memory();
        let embedder = FixedEmbeddings::new(32)
            .with_hashing_fallback()
            .failing_on("City\n");

        let err = IngestionPipeline::new(&store, &embedder).run(&model()).unwrap_err();
        assert_eq!(
            err.stage(),
            Some(&IngestStage::Attribute {
                dataset: "customers".into(),
                attribute: "city".into()
            })
        );
        assert!(matches!(err.root(), CatalogError::Embedding(_)));
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn test_existing_index_fails_before_writing() {
        let store = EmbeddedGraphStore::in_memory();
        let embedder = HashingEmbedder::new(32);
        {
            let mut session = store.connect().unwrap();
            session
                .create_vector_index("dataset-embeddings", 32, DistanceMetric::Cosine)
                .unwrap();
        }

        let err = IngestionPipeline::new(&store, &embedder).run(&model()).unwrap_err();
        assert!(matches!(err.root(), CatalogError::IndexAlreadyExists(_)));
        assert_eq!(store.connect().unwrap().node_count().unwrap(), 0);
    }

    #[test]
    fn test_rebuild_index() {
        let store = EmbeddedGraphStore::in_memory();
        let embedder = HashingEmbedder::new(32);
        let pipeline = IngestionPipeline::new(&store, &embedder).with_index_name("idx");

        // Rebuilding without an index just creates it
        assert_eq!(pipeline.rebuild_index().unwrap(), 0);
        pipeline.rebuild_index().unwrap();
        assert!(store.connect().unwrap().vector_index_exists("idx").unwrap());
    }
}
