//! Named vector indexes
//!
//! Each index is declared over one node label and one vector property.
//! Index contents are derived from node data and can always be rebuilt.

use crate::graph::NodeId;
use crate::vector::index::{DistanceMetric, VectorError, VectorIndex, VectorResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declaration of a vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    /// Nodes carrying this label are indexed
    pub label: String,
    /// Property holding the vector
    pub property_key: String,
    pub dimensions: usize,
    pub metric: DistanceMetric,
}

impl IndexDefinition {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        property_key: impl Into<String>,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            property_key: property_key.into(),
            dimensions,
            metric,
        }
    }

    /// True when a vector set on `property_key` of a node with `labels` belongs here
    pub fn covers<'a>(&self, mut labels: impl Iterator<Item = &'a str>, property_key: &str) -> bool {
        self.property_key == property_key && labels.any(|l| l == self.label)
    }
}

#[derive(Debug)]
struct ManagedIndex {
    definition: IndexDefinition,
    index: VectorIndex,
}

/// Manager for all vector indexes of a graph
#[derive(Debug, Default)]
pub struct VectorIndexManager {
    indices: IndexMap<String, ManagedIndex>,
}

impl VectorIndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty index. Fails if the name is taken.
    pub fn create_index(&mut self, definition: IndexDefinition) -> VectorResult<()> {
        if self.indices.contains_key(&definition.name) {
            return Err(VectorError::AlreadyExists(definition.name));
        }
        let index = VectorIndex::new(definition.dimensions, definition.metric);
        self.indices
            .insert(definition.name.clone(), ManagedIndex { definition, index });
        Ok(())
    }

    /// Drop an index by name. Returns false if it did not exist.
    pub fn drop_index(&mut self, name: &str) -> bool {
        self.indices.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// All index definitions, in creation order
    pub fn definitions(&self) -> Vec<IndexDefinition> {
        self.indices.values().map(|m| m.definition.clone()).collect()
    }

    /// Number of vectors held by an index
    pub fn indexed_count(&self, name: &str) -> Option<usize> {
        self.indices.get(name).map(|m| m.index.len())
    }

    /// Add a vector to one index
    pub fn add_vector(&mut self, name: &str, node_id: NodeId, vector: &[f32]) -> VectorResult<()> {
        match self.indices.get_mut(name) {
            Some(managed) => managed.index.add(node_id, vector),
            None => Err(VectorError::IndexError(format!("no vector index named `{}`", name))),
        }
    }

    /// Route a property write to every index covering it
    pub fn on_property_set<'a>(
        &mut self,
        labels: impl Iterator<Item = &'a str> + Clone,
        property_key: &str,
        node_id: NodeId,
        vector: &[f32],
    ) -> VectorResult<()> {
        for managed in self.indices.values_mut() {
            if managed.definition.covers(labels.clone(), property_key) {
                managed.index.add(node_id, vector)?;
            }
        }
        Ok(())
    }

    /// Forget a node in every index
    pub fn remove_node(&mut self, node_id: NodeId) {
        for managed in self.indices.values_mut() {
            if managed.index.contains(node_id) {
                managed.index.remove(node_id);
            }
        }
    }

    /// Search an index. A missing index yields no results.
    pub fn search(&self, name: &str, query: &[f32], k: usize) -> VectorResult<Vec<(NodeId, f32)>> {
        match self.indices.get(name) {
            Some(managed) => managed.index.search(query, k),
            None => Ok(Vec::new()),
        }
    }

    /// Empty every index, keeping definitions
    pub fn clear_points(&mut self) {
        for managed in self.indices.values_mut() {
            managed.index.clear();
        }
    }
}
