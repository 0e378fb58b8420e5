//! Property values stored on nodes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A property value: entity text, or an embedding routed to vector indexes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    /// Dense float vector, indexed by vector indexes
    Vector(Vec<f32>),
}

impl PropertyValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            PropertyValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Canonical key used by uniqueness constraints.
    ///
    /// Vectors are never unique-constrained and yield `None`.
    pub fn constraint_key(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) => Some(format!("s:{}", s)),
            PropertyValue::Vector(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Vector(v) => write!(f, "vector<{}>", v.len()),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<Vec<f32>> for PropertyValue {
    fn from(v: Vec<f32>) -> Self {
        PropertyValue::Vector(v)
    }
}

/// Property map for node properties
pub type PropertyMap = HashMap<String, PropertyValue>;
