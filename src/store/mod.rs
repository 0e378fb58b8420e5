//! Graph store facade
//!
//! Ingestion, search and teardown only talk to the store through
//! [`GraphStore`] and the [`StoreSession`]s it hands out. A session is
//! released when dropped, whichever way the caller exits.

pub mod embedded;

pub use embedded::{EmbeddedGraphStore, EmbeddedSession};

use crate::graph::{GraphError, Node, NodeId};
use crate::model::{Entity, EntityKind, RelationshipKind};
use crate::persistence::SnapshotError;
use crate::vector::DistanceMetric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Property holding an entity's embedding
pub const EMBEDDING_PROPERTY: &str = "embedding";

#[derive(Error, Debug)]
pub enum StoreError {
    /// Store could not be reached or opened
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Entity with id `{id}` already exists")]
    DuplicateEntity { id: String },

    #[error("Vector index `{0}` already exists")]
    IndexAlreadyExists(String),

    #[error("{kind} `{id}` not found")]
    EntityNotFound { kind: EntityKind, id: String },

    /// Only facts and attributes sit under a dataset
    #[error("{0} entities cannot be contained")]
    NotContainable(EntityKind),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// A thread panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// An entity node read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub node_id: NodeId,
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub description: String,
}

impl StoredEntity {
    /// Read an entity from a node; `None` if the node carries no entity kind
    pub fn from_node(node: &Node) -> Option<Self> {
        let kind = node.labels.iter().find_map(EntityKind::from_label)?;
        Some(Self {
            node_id: node.id,
            kind,
            id: node.string_property("id").to_string(),
            title: node.string_property("title").to_string(),
            description: node.string_property("description").to_string(),
        })
    }

    pub fn entity(&self) -> Entity {
        Entity::new(self.kind, &self.id, &self.title, &self.description)
    }
}

/// A vector index hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNode {
    pub entity: StoredEntity,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Counts reported by `stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub nodes: usize,
    pub relationships: usize,
    pub datasets: usize,
    pub facts: usize,
    pub attributes: usize,
    pub contains: usize,
    pub references: usize,
}

/// A store that hands out sessions
pub trait GraphStore {
    /// Acquire a session
    fn connect(&self) -> StoreResult<Box<dyn StoreSession>>;

    /// Fail early when the store cannot be used
    fn verify_connectivity(&self) -> StoreResult<()>;
}

/// Operations available on an open session
pub trait StoreSession {
    /// Create a node labelled with the entity kind and `Embedded`
    ///
    /// Fails with `DuplicateEntity` if any entity with this id exists.
    fn create_entity_node(&mut self, entity: &Entity) -> StoreResult<NodeId>;

    /// Attach or overwrite the embedding of the entity matched by kind and id
    fn set_embedding(&mut self, kind: EntityKind, id: &str, vector: &[f32]) -> StoreResult<()>;

    /// Link a dataset to a fact or attribute it contains. Returns true if the
    /// edge is new.
    fn link_contains(
        &mut self,
        parent_id: &str,
        child_kind: EntityKind,
        child_id: &str,
    ) -> StoreResult<bool>;

    /// Add a reference edge between two datasets, even if one already exists
    fn link_references(&mut self, from_id: &str, to_id: &str) -> StoreResult<()>;

    /// Create a vector index over all embedded entities, returning how many
    /// vectors it picked up
    fn create_vector_index(
        &mut self,
        name: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> StoreResult<usize>;

    /// Drop a vector index. Returns false if it did not exist.
    fn drop_vector_index(&mut self, name: &str) -> StoreResult<bool>;

    /// Remove every node and relationship, returning how many of each went
    fn delete_all(&mut self) -> StoreResult<(usize, usize)>;

    /// Up to `k` entities nearest to `query`, most similar first
    ///
    /// A missing index yields no results.
    fn query_vector_index(&self, name: &str, k: usize, query: &[f32]) -> StoreResult<Vec<ScoredNode>>;

    /// Dataset containing the entity, if any
    fn parent_of(&self, node: NodeId) -> StoreResult<Option<StoredEntity>>;

    fn find_entity(&self, kind: EntityKind, id: &str) -> StoreResult<Option<StoredEntity>>;

    fn vector_index_exists(&self, name: &str) -> StoreResult<bool>;

    fn node_count(&self) -> StoreResult<usize>;

    fn relationship_count(&self) -> StoreResult<usize>;

    fn count_entities(&self, kind: EntityKind) -> StoreResult<usize>;

    fn count_relationships(&self, kind: RelationshipKind) -> StoreResult<usize>;

    fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats {
            nodes: self.node_count()?,
            relationships: self.relationship_count()?,
            datasets: self.count_entities(EntityKind::Dataset)?,
            facts: self.count_entities(EntityKind::Fact)?,
            attributes: self.count_entities(EntityKind::Attribute)?,
            contains: self.count_relationships(RelationshipKind::Contains)?,
            references: self.count_relationships(RelationshipKind::References)?,
        })
    }

    /// Make this session's writes durable
    fn commit(&mut self) -> StoreResult<()>;
}
