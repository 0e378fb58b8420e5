//! Directed, typed relationships between nodes

use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge in the property graph
///
/// Several edges of the same type may connect the same pair of nodes;
/// deduplication is the caller's choice (see `PropertyGraph::merge_edge`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    /// Edge goes FROM this node
    pub source: NodeId,
    /// Edge goes TO this node
    pub target: NodeId,
    pub edge_type: EdgeType,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, edge_type: impl Into<EdgeType>) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: edge_type.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// True when this edge has the given type and direction
    pub fn links(&self, source: NodeId, target: NodeId, edge_type: &EdgeType) -> bool {
        self.source == source && self.target == target && &self.edge_type == edge_type
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}
