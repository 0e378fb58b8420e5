//! Bincode graph snapshots

use crate::graph::{Edge, GraphError, Node, PropertyGraph, UniqueConstraint};
use crate::vector::IndexDefinition;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Bumped whenever the snapshot layout changes
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Snapshot errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Snapshot content does not form a valid graph
    #[error("Corrupt snapshot: {0}")]
    Graph(#[from] GraphError),

    #[error("Unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Serialized form of a whole graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub constraints: Vec<UniqueConstraint>,
    pub vector_indexes: Vec<IndexDefinition>,
}

impl Snapshot {
    /// Capture the current state of a graph
    pub fn capture(graph: &PropertyGraph) -> Self {
        Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            nodes: graph.all_nodes().cloned().collect(),
            edges: graph.all_edges().cloned().collect(),
            constraints: graph.constraints().to_vec(),
            vector_indexes: graph.vector_indexes().definitions(),
        }
    }

    /// Rebuild a graph: constraints, then nodes and edges, then vector indexes
    pub fn restore(self) -> SnapshotResult<PropertyGraph> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.format_version,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }

        let mut graph = PropertyGraph::new();
        for constraint in self.constraints {
            graph.create_unique_constraint(constraint.label, constraint.property)?;
        }
        for node in self.nodes {
            graph.insert_recovered_node(node)?;
        }
        for edge in self.edges {
            graph.insert_recovered_edge(edge)?;
        }
        for definition in self.vector_indexes {
            let name = definition.name.clone();
            let indexed = graph.create_vector_index(definition)?;
            debug!("Rebuilt vector index {} with {} vectors", name, indexed);
        }
        Ok(graph)
    }

    /// Write the snapshot, replacing any previous file atomically
    pub fn save(&self, path: &Path) -> SnapshotResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Persist a graph to `path`
pub fn save_graph(graph: &PropertyGraph, path: &Path) -> SnapshotResult<()> {
    let snapshot = Snapshot::capture(graph);
    snapshot.save(path)?;
    info!(
        "Saved snapshot to {:?}: {} nodes, {} edges",
        path,
        snapshot.nodes.len(),
        snapshot.edges.len()
    );
    Ok(())
}

/// Load a graph from `path`. A missing file is not an error.
pub fn load_graph(path: &Path) -> SnapshotResult<Option<PropertyGraph>> {
    if !path.exists() {
        debug!("No snapshot at {:?}", path);
        return Ok(None);
    }
    let graph = Snapshot::load(path)?.restore()?;
    info!(
        "Loaded snapshot from {:?}: {} nodes, {} edges",
        path,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(Some(graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Label, PropertyMap, PropertyValue};
    use crate::vector::DistanceMetric;
    use tempfile::TempDir;

    fn sample_graph() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        graph.create_unique_constraint("Embedded", "id").unwrap();
        graph
            .create_vector_index(IndexDefinition::new("idx", "Embedded", "embedding", 2, DistanceMetric::Cosine))
            .unwrap();

        let mut props = PropertyMap::new();
        props.insert("id".to_string(), "d1".into());
        props.insert("embedding".to_string(), vec![1.0f32, 0.0].into());
        let d1 = graph
            .create_node_with_properties(vec![Label::new("Dataset"), Label::new("Embedded")], props)
            .unwrap();

        let mut props = PropertyMap::new();
        props.insert("id".to_string(), "f1".into());
        props.insert("embedding".to_string(), vec![0.0f32, 1.0].into());
        let f1 = graph
            .create_node_with_properties(vec![Label::new("Fact"), Label::new("Embedded")], props)
            .unwrap();
        graph.create_edge(d1, f1, "CONTAINS").unwrap();
        graph
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("graph.bin");

        save_graph(&sample_graph(), &path).unwrap();
        let graph = load_graph(&path).unwrap().unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.constraints().len(), 1);
        assert_eq!(graph.vector_indexes().indexed_count("idx"), Some(2));

        let hits = graph.vector_search("idx", &[0.0, 1.0], 1).unwrap();
        let top = graph.get_node(hits[0].0).unwrap();
        assert_eq!(top.get_property("id"), Some(&PropertyValue::from("f1")));
    }

    #[test]
    fn test_ids_continue_after_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.bin");
        save_graph(&sample_graph(), &path).unwrap();

        let mut graph = load_graph(&path).unwrap().unwrap();
        let existing: Vec<_> = graph.all_nodes().map(|n| n.id).collect();
        let fresh = graph
            .create_node_with_properties(vec![Label::new("Attribute")], PropertyMap::new())
            .unwrap();
        assert!(!existing.contains(&fresh));

        // Constraints are enforced on the restored graph
        let mut props = PropertyMap::new();
        props.insert("id".to_string(), "d1".into());
        assert!(graph
            .create_node_with_properties(vec![Label::new("Embedded")], props)
            .is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_graph(&dir.path().join("none.bin")).unwrap().is_none());
    }

    #[test]
    fn test_version_check() {
        let mut snapshot = Snapshot::capture(&sample_graph());
        snapshot.format_version = 99;
        assert!(matches!(
            snapshot.restore(),
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
