//! Core property graph
//!
//! Nodes with multiple labels and properties, directed typed edges,
//! uniqueness constraints and vector indexes over node properties.

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, PropertyGraph, UniqueConstraint};
pub use types::{EdgeId, EdgeType, Label, NodeId};
