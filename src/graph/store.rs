//! In-memory property graph
//!
//! Storage layout:
//! - nodes: NodeId -> Node (insertion ordered)
//! - edges: EdgeId -> Edge
//! - outgoing / incoming: NodeId -> Vec<EdgeId> adjacency lists
//! - label_index: Label -> node set
//! - edge_type_index: EdgeType -> edge set
//! - unique_index: (label, property, value) -> node, for declared constraints
//! - vector_index: named vector indexes fed by vector-valued properties

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use crate::vector::{IndexDefinition, VectorError, VectorIndexManager};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Node already exists with label `{label}` and property `{property}` = {value}")]
    ConstraintViolation {
        label: String,
        property: String,
        value: String,
    },

    #[error(transparent)]
    Vector(#[from] VectorError),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Uniqueness constraint on one property of one label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub label: Label,
    pub property: String,
}

type UniqueKey = (Label, String, String);

/// In-memory property graph with label, relationship-type, uniqueness and
/// vector indexes
#[derive(Debug)]
pub struct PropertyGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    label_index: HashMap<Label, HashSet<NodeId>>,
    edge_type_index: HashMap<EdgeType, HashSet<EdgeId>>,
    constraints: Vec<UniqueConstraint>,
    unique_index: HashMap<UniqueKey, NodeId>,
    vector_index: VectorIndexManager,
    next_node_id: u64,
    next_edge_id: u64,
}

impl PropertyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        PropertyGraph {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            label_index: HashMap::new(),
            edge_type_index: HashMap::new(),
            constraints: Vec::new(),
            unique_index: HashMap::new(),
            vector_index: VectorIndexManager::new(),
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    // ============================================================
    // Constraints
    // ============================================================

    /// Declare a uniqueness constraint. Returns false if it already existed.
    ///
    /// Fails without registering anything if existing nodes already violate it.
    pub fn create_unique_constraint(
        &mut self,
        label: impl Into<Label>,
        property: impl Into<String>,
    ) -> GraphResult<bool> {
        let constraint = UniqueConstraint {
            label: label.into(),
            property: property.into(),
        };
        if self.constraints.contains(&constraint) {
            return Ok(false);
        }

        let mut entries = HashMap::new();
        for node in self.get_nodes_by_label(&constraint.label) {
            let Some(key) = node
                .get_property(&constraint.property)
                .and_then(PropertyValue::constraint_key)
            else {
                continue;
            };
            let unique_key = (constraint.label.clone(), constraint.property.clone(), key);
            if entries.insert(unique_key, node.id).is_some() {
                return Err(Self::violation(&constraint, node.get_property(&constraint.property)));
            }
        }

        self.unique_index.extend(entries);
        self.constraints.push(constraint);
        Ok(true)
    }

    pub fn constraints(&self) -> &[UniqueConstraint] {
        &self.constraints
    }

    fn violation(constraint: &UniqueConstraint, value: Option<&PropertyValue>) -> GraphError {
        GraphError::ConstraintViolation {
            label: constraint.label.to_string(),
            property: constraint.property.clone(),
            value: value.map(ToString::to_string).unwrap_or_default(),
        }
    }

    /// Unique keys a node with these labels/properties would occupy
    fn unique_keys(&self, labels: &HashSet<Label>, properties: &PropertyMap) -> Vec<(&UniqueConstraint, UniqueKey)> {
        self.constraints
            .iter()
            .filter(|c| labels.contains(&c.label))
            .filter_map(|c| {
                properties
                    .get(&c.property)
                    .and_then(PropertyValue::constraint_key)
                    .map(|key| (c, (c.label.clone(), c.property.clone(), key)))
            })
            .collect()
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node with labels and properties
    ///
    /// Vector-valued properties are added to every vector index covering
    /// one of the node's labels.
    pub fn create_node_with_properties(
        &mut self,
        labels: Vec<Label>,
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        let label_set: HashSet<Label> = labels.iter().cloned().collect();

        let keys: Vec<UniqueKey> = {
            let claimed = self.unique_keys(&label_set, &properties);
            for (constraint, key) in &claimed {
                if self.unique_index.contains_key(key) {
                    return Err(Self::violation(constraint, properties.get(&constraint.property)));
                }
            }
            claimed.into_iter().map(|(_, key)| key).collect()
        };

        let node_id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;

        let node = Node::new_with_properties(node_id, labels, properties);
        self.index_node(&node);
        for key in keys {
            self.unique_index.insert(key, node_id);
        }

        let vectors: Vec<(String, Vec<f32>)> = node
            .properties
            .iter()
            .filter_map(|(k, v)| v.as_vector().map(|vec| (k.clone(), vec.to_vec())))
            .collect();
        self.nodes.insert(node_id, node);

        for (key, vector) in vectors {
            if let Err(e) = self.index_vector(node_id, &key, &vector) {
                let _ = self.delete_node(node_id);
                return Err(e);
            }
        }

        Ok(node_id)
    }

    fn index_node(&mut self, node: &Node) {
        for label in &node.labels {
            self.label_index
                .entry(label.clone())
                .or_default()
                .insert(node.id);
        }
    }

    fn index_vector(&mut self, node_id: NodeId, key: &str, vector: &[f32]) -> GraphResult<()> {
        let node = self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let labels: Vec<&str> = node.labels.iter().map(Label::as_str).collect();
        self.vector_index
            .on_property_set(labels.into_iter(), key, node_id, vector)?;
        Ok(())
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Set a property on a node, keeping uniqueness and vector indexes in step
    ///
    /// Returns the previous value.
    pub fn set_node_property(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let key = key.into();
        let value = value.into();
        let node = self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;

        let mut single = PropertyMap::new();
        single.insert(key.clone(), value.clone());
        let claimed: Vec<UniqueKey> = {
            let claimed = self.unique_keys(&node.labels, &single);
            for (constraint, unique_key) in &claimed {
                match self.unique_index.get(unique_key) {
                    Some(owner) if *owner != node_id => {
                        return Err(Self::violation(constraint, Some(&value)));
                    }
                    _ => {}
                }
            }
            claimed.into_iter().map(|(_, k)| k).collect()
        };
        let released: Vec<UniqueKey> = match node.get_property(&key) {
            Some(old) => {
                let mut previous = PropertyMap::new();
                previous.insert(key.clone(), old.clone());
                self.unique_keys(&node.labels, &previous)
                    .into_iter()
                    .map(|(_, k)| k)
                    .collect()
            }
            None => Vec::new(),
        };

        if let Some(vector) = value.as_vector() {
            self.index_vector(node_id, &key, vector)?;
        }

        for unique_key in released {
            self.unique_index.remove(&unique_key);
        }
        for unique_key in claimed {
            self.unique_index.insert(unique_key, node_id);
        }

        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        Ok(node.set_property(key, value))
    }

    /// Find a node by label and property value
    ///
    /// Constrained (label, property) pairs are answered from the uniqueness
    /// index; anything else scans the label.
    pub fn find_node(&self, label: &Label, property: &str, value: &PropertyValue) -> Option<NodeId> {
        let constrained = self
            .constraints
            .iter()
            .any(|c| &c.label == label && c.property == property);
        if constrained {
            let key = value.constraint_key()?;
            return self
                .unique_index
                .get(&(label.clone(), property.to_string(), key))
                .copied();
        }

        self.label_index.get(label).and_then(|ids| {
            let mut matches: Vec<NodeId> = ids
                .iter()
                .copied()
                .filter(|id| {
                    self.nodes
                        .get(id)
                        .and_then(|n| n.get_property(property))
                        .is_some_and(|v| v == value)
                })
                .collect();
            matches.sort();
            matches.first().copied()
        })
    }

    /// Delete a node and all its connected edges
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let node = self.nodes.shift_remove(&id).ok_or(GraphError::NodeNotFound(id))?;

        for label in &node.labels {
            if let Some(set) = self.label_index.get_mut(label) {
                set.remove(&id);
            }
        }
        self.unique_index.retain(|_, owner| *owner != id);
        self.vector_index.remove_node(id);

        let outgoing = self.outgoing.remove(&id).unwrap_or_default();
        let incoming = self.incoming.remove(&id).unwrap_or_default();
        for edge_id in outgoing.iter().chain(incoming.iter()) {
            let _ = self.delete_edge(*edge_id);
        }

        Ok(node)
    }

    // ============================================================
    // Edges
    // ============================================================

    /// Create an edge between two nodes
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        if !self.has_node(source) {
            return Err(GraphError::InvalidEdgeSource(source));
        }
        if !self.has_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target));
        }

        let edge_id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;

        let edge = Edge::new(edge_id, source, target, edge_type);
        self.link_edge(&edge);
        self.edges.insert(edge_id, edge);
        Ok(edge_id)
    }

    /// Return the existing edge of this type and direction, or create one
    ///
    /// The boolean is true when a new edge was created.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<(EdgeId, bool)> {
        let edge_type = edge_type.into();
        let existing = self
            .get_outgoing_edges(source)
            .into_iter()
            .find(|e| e.links(source, target, &edge_type))
            .map(|e| e.id);

        match existing {
            Some(id) => Ok((id, false)),
            None => self.create_edge(source, target, edge_type).map(|id| (id, true)),
        }
    }

    fn link_edge(&mut self, edge: &Edge) {
        self.outgoing.entry(edge.source).or_default().push(edge.id);
        self.incoming.entry(edge.target).or_default().push(edge.id);
        self.edge_type_index
            .entry(edge.edge_type.clone())
            .or_default()
            .insert(edge.id);
    }

    /// Delete an edge
    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.edges.shift_remove(&id).ok_or(GraphError::EdgeNotFound(id))?;

        if let Some(set) = self.edge_type_index.get_mut(&edge.edge_type) {
            set.remove(&id);
        }
        if let Some(adj) = self.outgoing.get_mut(&edge.source) {
            adj.retain(|&eid| eid != id);
        }
        if let Some(adj) = self.incoming.get_mut(&edge.target) {
            adj.retain(|&eid| eid != id);
        }

        Ok(edge)
    }

    /// Get all outgoing edges from a node
    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get all incoming edges to a node
    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(&node_id)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Get all nodes with a specific label, in creation order
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self
            .label_index
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// Get all edges of a specific type
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .edge_type_index
            .get(edge_type)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default();
        edges.sort_by_key(|e| e.id);
        edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Remove every node and edge
    ///
    /// Constraints and vector index definitions survive; the indexes are
    /// emptied.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.label_index.clear();
        self.edge_type_index.clear();
        self.unique_index.clear();
        self.vector_index.clear_points();
    }

    // ============================================================
    // Vector Index methods
    // ============================================================

    /// Create a vector index and populate it from existing nodes
    pub fn create_vector_index(&mut self, definition: IndexDefinition) -> GraphResult<usize> {
        let name = definition.name.clone();
        let label = Label::new(definition.label.clone());
        let property = definition.property_key.clone();
        self.vector_index.create_index(definition)?;

        let points: Vec<(NodeId, Vec<f32>)> = self
            .get_nodes_by_label(&label)
            .into_iter()
            .filter_map(|n| {
                n.get_property(&property)
                    .and_then(PropertyValue::as_vector)
                    .map(|v| (n.id, v.to_vec()))
            })
            .collect();

        for (node_id, vector) in &points {
            if let Err(e) = self.vector_index.add_vector(&name, *node_id, vector) {
                self.vector_index.drop_index(&name);
                return Err(e.into());
            }
        }
        Ok(points.len())
    }

    /// Drop a vector index. Returns false if it did not exist.
    pub fn drop_vector_index(&mut self, name: &str) -> bool {
        self.vector_index.drop_index(name)
    }

    pub fn has_vector_index(&self, name: &str) -> bool {
        self.vector_index.contains(name)
    }

    pub fn vector_indexes(&self) -> &VectorIndexManager {
        &self.vector_index
    }

    /// Search for nearest neighbors using a named vector index
    ///
    /// Results are `(node, similarity)` with the highest similarity first.
    /// Searching a missing index returns nothing.
    pub fn vector_search(&self, name: &str, query: &[f32], k: usize) -> GraphResult<Vec<(NodeId, f32)>> {
        Ok(self.vector_index.search(name, query, k)?)
    }

    // ============================================================
    // Recovery methods - used to rebuild the graph from a snapshot
    // ============================================================

    /// Insert a recovered node, preserving its ID
    ///
    /// Vector indexes are not fed here; they are recreated afterwards.
    pub(crate) fn insert_recovered_node(&mut self, node: Node) -> GraphResult<()> {
        let node_id = node.id;
        let keys: Vec<UniqueKey> = {
            let claimed = self.unique_keys(&node.labels, &node.properties);
            for (constraint, key) in &claimed {
                if self.unique_index.contains_key(key) {
                    return Err(Self::violation(constraint, node.get_property(&constraint.property)));
                }
            }
            claimed.into_iter().map(|(_, key)| key).collect()
        };

        self.index_node(&node);
        for key in keys {
            self.unique_index.insert(key, node_id);
        }
        self.nodes.insert(node_id, node);

        if node_id.as_u64() >= self.next_node_id {
            self.next_node_id = node_id.as_u64() + 1;
        }
        Ok(())
    }

    /// Insert a recovered edge, preserving its ID
    ///
    /// Source and target nodes must already exist.
    pub(crate) fn insert_recovered_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.has_node(edge.source) {
            return Err(GraphError::InvalidEdgeSource(edge.source));
        }
        if !self.has_node(edge.target) {
            return Err(GraphError::InvalidEdgeTarget(edge.target));
        }

        let edge_id = edge.id;
        self.link_edge(&edge);
        self.edges.insert(edge_id, edge);

        if edge_id.as_u64() >= self.next_edge_id {
            self.next_edge_id = edge_id.as_u64() + 1;
        }
        Ok(())
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::DistanceMetric;

    fn props(id: &str) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("id".to_string(), id.into());
        props
    }

    fn node(graph: &mut PropertyGraph, label: &str) -> NodeId {
        graph
            .create_node_with_properties(vec![Label::new(label)], PropertyMap::new())
            .unwrap()
    }

    #[test]
    fn test_create_and_get_node() {
        let mut graph = PropertyGraph::new();
        let node_id = graph
            .create_node_with_properties(vec![Label::new("Dataset"), Label::new("Embedded")], props("d1"))
            .unwrap();

        assert_eq!(graph.node_count(), 1);
        let node = graph.get_node(node_id).unwrap();
        assert!(node.has_label(&Label::new("Dataset")));
        assert_eq!(node.string_property("id"), "d1");
    }

    #[test]
    fn test_edge_validation() {
        let mut graph = PropertyGraph::new();
        let dataset = node(&mut graph, "Dataset");
        let invalid = NodeId::new(999);

        assert_eq!(
            graph.create_edge(invalid, dataset, "REFERENCES"),
            Err(GraphError::InvalidEdgeSource(invalid))
        );
        assert_eq!(
            graph.create_edge(dataset, invalid, "REFERENCES"),
            Err(GraphError::InvalidEdgeTarget(invalid))
        );
    }

    #[test]
    fn test_merge_edge_is_idempotent() {
        let mut graph = PropertyGraph::new();
        let parent = node(&mut graph, "Dataset");
        let child = node(&mut graph, "Fact");

        let (first, created) = graph.merge_edge(parent, child, "CONTAINS").unwrap();
        assert!(created);
        let (second, created) = graph.merge_edge(parent, child, "CONTAINS").unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(graph.edge_count(), 1);

        // A different type or direction is a different edge
        graph.merge_edge(child, parent, "CONTAINS").unwrap();
        graph.merge_edge(parent, child, "REFERENCES").unwrap();
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_create_edge_allows_parallel_edges() {
        let mut graph = PropertyGraph::new();
        let a = node(&mut graph, "Dataset");
        let b = node(&mut graph, "Dataset");

        graph.create_edge(a, b, "REFERENCES").unwrap();
        graph.create_edge(a, b, "REFERENCES").unwrap();
        assert_eq!(graph.get_outgoing_edges(a).len(), 2);
        assert_eq!(graph.get_edges_by_type(&EdgeType::new("REFERENCES")).len(), 2);
    }

    #[test]
    fn test_unique_constraint_rejects_duplicates() {
        let mut graph = PropertyGraph::new();
        assert!(graph.create_unique_constraint("Embedded", "id").unwrap());
        assert!(!graph.create_unique_constraint("Embedded", "id").unwrap());

        graph
            .create_node_with_properties(vec![Label::new("Dataset"), Label::new("Embedded")], props("x"))
            .unwrap();
        let err = graph
            .create_node_with_properties(vec![Label::new("Fact"), Label::new("Embedded")], props("x"))
            .unwrap_err();
        assert!(matches!(err, GraphError::ConstraintViolation { .. }));
        assert_eq!(graph.node_count(), 1);

        // Unconstrained labels are not checked
        graph.create_node_with_properties(vec![Label::new("Other")], props("x")).unwrap();
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_unique_constraint_on_existing_duplicates_fails() {
        let mut graph = PropertyGraph::new();
        graph.create_node_with_properties(vec![Label::new("Embedded")], props("x")).unwrap();
        graph.create_node_with_properties(vec![Label::new("Embedded")], props("x")).unwrap();
        assert!(graph.create_unique_constraint("Embedded", "id").is_err());
        assert!(graph.constraints().is_empty());
    }

    #[test]
    fn test_find_node() {
        let mut graph = PropertyGraph::new();
        graph.create_unique_constraint("Embedded", "id").unwrap();
        let d1 = graph
            .create_node_with_properties(vec![Label::new("Dataset"), Label::new("Embedded")], props("d1"))
            .unwrap();

        let id: PropertyValue = "d1".into();
        assert_eq!(graph.find_node(&Label::new("Embedded"), "id", &id), Some(d1));
        assert_eq!(graph.find_node(&Label::new("Dataset"), "id", &id), Some(d1));
        assert_eq!(graph.find_node(&Label::new("Fact"), "id", &id), None);
        assert_eq!(graph.find_node(&Label::new("Embedded"), "id", &"zz".into()), None);
    }

    #[test]
    fn test_vector_property_feeds_index() {
        let mut graph = PropertyGraph::new();
        let node = graph
            .create_node_with_properties(vec![Label::new("Embedded")], props("a"))
            .unwrap();
        graph.set_node_property(node, "embedding", vec![1.0f32, 0.0]).unwrap();

        // Index created after the data is populated from it
        let definition = IndexDefinition::new("idx", "Embedded", "embedding", 2, DistanceMetric::Cosine);
        assert_eq!(graph.create_vector_index(definition.clone()).unwrap(), 1);
        assert!(matches!(
            graph.create_vector_index(definition),
            Err(GraphError::Vector(VectorError::AlreadyExists(_)))
        ));

        // Later writes are routed to it
        let other = graph
            .create_node_with_properties(vec![Label::new("Embedded")], props("b"))
            .unwrap();
        graph.set_node_property(other, "embedding", vec![0.0f32, 1.0]).unwrap();

        let hits = graph.vector_search("idx", &[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].0, other);
        assert!(graph.vector_search("missing", &[0.0, 1.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_vector_dimension_mismatch_rolls_back_node() {
        let mut graph = PropertyGraph::new();
        graph
            .create_vector_index(IndexDefinition::new("idx", "Embedded", "embedding", 3, DistanceMetric::Cosine))
            .unwrap();

        let mut properties = props("a");
        properties.insert("embedding".to_string(), vec![1.0f32].into());
        let result = graph.create_node_with_properties(vec![Label::new("Embedded")], properties);
        assert!(matches!(result, Err(GraphError::Vector(VectorError::DimensionMismatch { .. }))));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_delete_node_removes_edges() {
        let mut graph = PropertyGraph::new();
        let a = node(&mut graph, "Dataset");
        let b = node(&mut graph, "Fact");
        graph.create_edge(a, b, "CONTAINS").unwrap();

        graph.delete_node(a).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.get_incoming_edges(b).is_empty());
    }

    #[test]
    fn test_clear_keeps_definitions() {
        let mut graph = PropertyGraph::new();
        graph.create_unique_constraint("Embedded", "id").unwrap();
        graph
            .create_vector_index(IndexDefinition::new("idx", "Embedded", "embedding", 2, DistanceMetric::Cosine))
            .unwrap();
        let mut properties = props("a");
        properties.insert("embedding".to_string(), vec![1.0f32, 0.0].into());
        let a = graph.create_node_with_properties(vec![Label::new("Embedded")], properties).unwrap();
        let b = node(&mut graph, "Fact");
        graph.create_edge(a, b, "CONTAINS").unwrap();

        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.has_vector_index("idx"));
        assert_eq!(graph.vector_indexes().indexed_count("idx"), Some(0));
        assert_eq!(graph.constraints().len(), 1);

        // The freed id is available again
        graph.create_node_with_properties(vec![Label::new("Embedded")], props("a")).unwrap();
    }
}
