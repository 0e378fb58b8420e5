//! Graph store backed by the in-process property graph
//!
//! All sessions share one graph behind a lock. When a data path is set the
//! graph is loaded from its snapshot on open and written back on commit.

use super::{
    GraphStore, ScoredNode, StoreError, StoreResult, StoreSession, StoredEntity, EMBEDDING_PROPERTY,
};
use crate::config::StoreConfig;
use crate::graph::{GraphError, Label, NodeId, PropertyGraph, PropertyMap, PropertyValue};
use crate::model::{Entity, EntityKind, RelationshipKind, EMBEDDED_LABEL};
use crate::persistence::{load_graph, save_graph};
use crate::vector::{DistanceMetric, IndexDefinition, VectorError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Embedded graph store
#[derive(Debug, Clone)]
pub struct EmbeddedGraphStore {
    graph: Arc<RwLock<PropertyGraph>>,
    data_path: Option<PathBuf>,
    open_sessions: Arc<AtomicUsize>,
}

impl EmbeddedGraphStore {
    /// A store that lives only as long as the process
    pub fn in_memory() -> Self {
        let mut graph = PropertyGraph::new();
        // A fresh graph has no nodes, so the constraint cannot be violated
        let _ = graph.create_unique_constraint(EMBEDDED_LABEL, "id");
        Self::from_graph(graph, None)
    }

    /// Open the store described by `config`, loading its snapshot if present
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let Some(path) = &config.data_path else {
            return Ok(Self::in_memory());
        };

        let mut graph = load_graph(path)?.unwrap_or_default();
        if graph.create_unique_constraint(EMBEDDED_LABEL, "id")? {
            debug!("Created uniqueness constraint on {}.id", EMBEDDED_LABEL);
        }
        info!(
            "Opened graph store at {:?} ({} nodes, {} relationships)",
            path,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self::from_graph(graph, Some(path.clone())))
    }

    fn from_graph(graph: PropertyGraph, data_path: Option<PathBuf>) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
            data_path,
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sessions not yet released
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    /// Open a session with its concrete type
    pub fn session(&self) -> StoreResult<EmbeddedSession> {
        if self.graph.is_poisoned() {
            return Err(StoreError::Poisoned);
        }
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Session opened ({} open)", open);
        Ok(EmbeddedSession {
            graph: Arc::clone(&self.graph),
            data_path: self.data_path.clone(),
            dirty: false,
            _guard: SessionGuard(Arc::clone(&self.open_sessions)),
        })
    }
}

impl GraphStore for EmbeddedGraphStore {
    fn connect(&self) -> StoreResult<Box<dyn StoreSession>> {
        Ok(Box::new(self.session()?))
    }

    fn verify_connectivity(&self) -> StoreResult<()> {
        if self.graph.is_poisoned() {
            return Err(StoreError::Poisoned);
        }
        let Some(path) = &self.data_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("cannot create {:?}: {}", parent, e)))?;
        }
        if path.exists() {
            fs::File::open(path)
                .map_err(|e| StoreError::Unavailable(format!("cannot read {:?}: {}", path, e)))?;
        }
        Ok(())
    }
}

/// Decrements the open-session count when the session goes away
#[derive(Debug)]
struct SessionGuard(Arc<AtomicUsize>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let remaining = self.0.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!("Session released ({} open)", remaining);
    }
}

/// Session on an [`EmbeddedGraphStore`]
#[derive(Debug)]
pub struct EmbeddedSession {
    graph: Arc<RwLock<PropertyGraph>>,
    data_path: Option<PathBuf>,
    dirty: bool,
    _guard: SessionGuard,
}

impl EmbeddedSession {
    fn read(&self) -> StoreResult<RwLockReadGuard<'_, PropertyGraph>> {
        self.graph.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&mut self) -> StoreResult<RwLockWriteGuard<'_, PropertyGraph>> {
        self.dirty = true;
        self.graph.write().map_err(|_| StoreError::Poisoned)
    }

    /// Node of the entity with this id, required to be of `kind`
    fn locate(graph: &PropertyGraph, kind: EntityKind, id: &str) -> StoreResult<NodeId> {
        graph
            .find_node(&Label::new(EMBEDDED_LABEL), "id", &PropertyValue::from(id))
            .filter(|node_id| {
                graph
                    .get_node(*node_id)
                    .is_some_and(|n| n.has_label(&Label::new(kind.label())))
            })
            .ok_or_else(|| StoreError::EntityNotFound {
                kind,
                id: id.to_string(),
            })
    }
}

impl StoreSession for EmbeddedSession {
    fn create_entity_node(&mut self, entity: &Entity) -> StoreResult<NodeId> {
        let mut properties = PropertyMap::new();
        properties.insert("id".to_string(), entity.id.as_str().into());
        properties.insert("title".to_string(), entity.title.as_str().into());
        properties.insert("description".to_string(), entity.description.as_str().into());

        let labels = vec![Label::new(entity.kind.label()), Label::new(EMBEDDED_LABEL)];
        let mut graph = self.write()?;
        match graph.create_node_with_properties(labels, properties) {
            Ok(node_id) => Ok(node_id),
            Err(GraphError::ConstraintViolation { .. }) => Err(StoreError::DuplicateEntity {
                id: entity.id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn set_embedding(&mut self, kind: EntityKind, id: &str, vector: &[f32]) -> StoreResult<()> {
        let mut graph = self.write()?;
        let node_id = Self::locate(&graph, kind, id)?;
        graph.set_node_property(node_id, EMBEDDING_PROPERTY, vector.to_vec())?;
        Ok(())
    }

    fn link_contains(
        &mut self,
        parent_id: &str,
        child_kind: EntityKind,
        child_id: &str,
    ) -> StoreResult<bool> {
        if child_kind == EntityKind::Dataset {
            return Err(StoreError::NotContainable(child_kind));
        }
        let mut graph = self.write()?;
        let parent = Self::locate(&graph, EntityKind::Dataset, parent_id)?;
        let child = Self::locate(&graph, child_kind, child_id)?;
        let (_, created) = graph.merge_edge(parent, child, RelationshipKind::Contains.as_str())?;
        Ok(created)
    }

    fn link_references(&mut self, from_id: &str, to_id: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        let from = Self::locate(&graph, EntityKind::Dataset, from_id)?;
        let to = Self::locate(&graph, EntityKind::Dataset, to_id)?;
        graph.create_edge(from, to, RelationshipKind::References.as_str())?;
        Ok(())
    }

    fn create_vector_index(
        &mut self,
        name: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> StoreResult<usize> {
        let definition = IndexDefinition::new(name, EMBEDDED_LABEL, EMBEDDING_PROPERTY, dimensions, metric);
        let mut graph = self.write()?;
        match graph.create_vector_index(definition) {
            Ok(indexed) => Ok(indexed),
            Err(GraphError::Vector(VectorError::AlreadyExists(name))) => {
                Err(StoreError::IndexAlreadyExists(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn drop_vector_index(&mut self, name: &str) -> StoreResult<bool> {
        Ok(self.write()?.drop_vector_index(name))
    }

    fn delete_all(&mut self) -> StoreResult<(usize, usize)> {
        let mut graph = self.write()?;
        let removed = (graph.node_count(), graph.edge_count());
        graph.clear();
        Ok(removed)
    }

    fn query_vector_index(&self, name: &str, k: usize, query: &[f32]) -> StoreResult<Vec<ScoredNode>> {
        let graph = self.read()?;
        let hits = graph.vector_search(name, query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(node_id, score)| {
                let entity = graph.get_node(node_id).and_then(StoredEntity::from_node)?;
                Some(ScoredNode { entity, score })
            })
            .collect())
    }

    fn parent_of(&self, node: NodeId) -> StoreResult<Option<StoredEntity>> {
        let graph = self.read()?;
        let contains = RelationshipKind::Contains.as_str();
        Ok(graph
            .get_incoming_edges(node)
            .into_iter()
            .filter(|e| e.edge_type.as_str() == contains)
            .find_map(|e| graph.get_node(e.source).and_then(StoredEntity::from_node)))
    }

    fn find_entity(&self, kind: EntityKind, id: &str) -> StoreResult<Option<StoredEntity>> {
        let graph = self.read()?;
        Ok(Self::locate(&graph, kind, id)
            .ok()
            .and_then(|node_id| graph.get_node(node_id))
            .and_then(StoredEntity::from_node))
    }

    fn vector_index_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.read()?.has_vector_index(name))
    }

    fn node_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.node_count())
    }

    fn relationship_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.edge_count())
    }

    fn count_entities(&self, kind: EntityKind) -> StoreResult<usize> {
        Ok(self.read()?.get_nodes_by_label(&Label::new(kind.label())).len())
    }

    fn count_relationships(&self, kind: RelationshipKind) -> StoreResult<usize> {
        Ok(self.read()?.get_edges_by_type(&kind.as_str().into()).len())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.data_path {
            let graph = self.graph.read().map_err(|_| StoreError::Poisoned)?;
            save_graph(&graph, path)?;
        }
        self.dirty = false;
        Ok(())
    }
}
