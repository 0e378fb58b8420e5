//! Persistence for the embedded graph store
//!
//! The whole graph is written as one bincode snapshot. Vector index
//! contents are never stored; only their definitions are, and the indexes
//! are rebuilt from node properties on load.

pub mod snapshot;

pub use snapshot::{load_graph, save_graph, Snapshot, SnapshotError, SnapshotResult, SNAPSHOT_FORMAT_VERSION};
